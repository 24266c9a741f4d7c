//! # nertag-core — Geração de Features e Arbitragem de Spans para NER
//!
//! Este crate implementa o núcleo reutilizável de um sistema de
//! Reconhecimento de Entidades Nomeadas: a transformação de sentenças
//! tokenizadas em contextos de features para um classificador de sequência
//! externo, e a fusão dos spans candidatos de vários anotadores
//! independentes em uma única camada sem sobreposições. O mesmo núcleo é
//! usado, sem variação, no treino, na avaliação e na anotação.
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui por dois caminhos paralelos que se encontram na arbitragem:
//!
//! 1.  **Caminho estatístico**: tokens → [`generator::CachedGenerator`]
//!     (pipeline de geradores componíveis) → contextos de features por
//!     índice → classificador externo ([`annotator::SequenceClassifier`])
//!     → sequência de outcomes → [`codec`] → spans.
//! 2.  **Caminhos determinísticos**: tokens → [`gazetteer::GazetteerMatcher`]
//!     (maior correspondência de dicionário) e [`recognizer::NumericRecognizer`]
//!     (padrões numéricos) → spans.
//! 3.  **Arbitragem**: todos os spans → [`span::drop_overlapping`] →
//!     entidades finais ([`annotator::Entity`]).
//!
//! ## Módulos Principais
//!
//! - [`annotator`]: raiz de composição, uma sentença por vez.
//! - [`generator`]: arcabouço de geradores (agregação, janela, cache).
//! - [`features`]: os geradores concretos (texto, forma, afixos, léxicos...).
//! - [`codec`]: esquemas BIO/BILOU e o validador de adjacência.
//! - [`config`]: descrição declarativa (JSON) do pipeline.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use nertag_core::{
//!     Annotator, ClassifierOutput, Dictionary, GazetteerMatcher, GeneratorSpec,
//!     ResourceRegistry, SequenceClassifier, TagScheme,
//! };
//!
//! // Classificador de demonstração: não reconhece nada (tudo "O").
//! // Em produção, aqui entra o modelo treinado com seu decodificador.
//! struct SemModelo;
//! impl SequenceClassifier for SemModelo {
//!     fn best_sequence(
//!         &self,
//!         tokens: &[String],
//!         _contexts: &[Vec<String>],
//!         _additional: &HashMap<String, String>,
//!     ) -> nertag_core::Result<ClassifierOutput> {
//!         Ok(ClassifierOutput {
//!             outcomes: vec!["O".to_string(); tokens.len()],
//!             probs: vec![1.0; tokens.len()],
//!         })
//!     }
//! }
//!
//! // Pipeline padrão de features + um gazetteer em memória
//! let registry = ResourceRegistry::new();
//! let pipeline = GeneratorSpec::default_pipeline().build_cached(&registry)?;
//! let mut annotator = Annotator::new(SemModelo, pipeline, TagScheme::Bilou);
//! annotator.add_gazetteer(GazetteerMatcher::new(Arc::new(
//!     Dictionary::from_entries([("são paulo", "LOC")], false),
//! )));
//!
//! let tokens: Vec<String> = ["Visitei", "São", "Paulo", "ontem"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let entities = annotator.annotate(&tokens)?;
//!
//! assert_eq!(entities.len(), 1);
//! assert_eq!(entities[0].text, "São Paulo");
//! assert_eq!(entities[0].label, "LOC");
//! # Ok::<(), nertag_core::Error>(())
//! ```

pub mod annotator;
pub mod codec;
pub mod config;
pub mod error;
pub mod features;
pub mod gazetteer;
pub mod generator;
pub mod lexicon;
pub mod recognizer;
pub mod shape;
pub mod span;

pub use annotator::{
    Annotator, ClassifierOutput, ClearPolicy, Entity, LabeledSentence, SequenceClassifier,
};
pub use codec::{SequenceValidator, TagScheme, ValidatorState};
pub use config::{pipeline_from_json, GeneratorSpec};
pub use error::{Error, Result};
pub use gazetteer::GazetteerMatcher;
pub use generator::{AggregatedGenerator, CachedGenerator, FeatureGenerator, WindowWrapper};
pub use lexicon::{ClusterLexicon, Dictionary, ResourceRegistry};
pub use recognizer::NumericRecognizer;
pub use span::{drop_overlapping, Span};
