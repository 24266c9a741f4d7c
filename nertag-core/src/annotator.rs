//! # Anotador — Raiz de Composição
//!
//! O anotador coordena, por sentença, as três fontes independentes de spans
//! e a arbitragem final:
//!
//! 1. **Classificador estatístico** (externo, via [`SequenceClassifier`]):
//!    recebe os contextos de features e devolve a melhor sequência de
//!    outcomes com probabilidades; os outcomes viram spans pelo codec.
//! 2. **Gazetteers** ([`GazetteerMatcher`]): casamento direto de dicionário.
//! 3. **Reconhecedor numérico** ([`NumericRecognizer`]): padrões por regra.
//!
//! Todas as fontes alimentam [`drop_overlapping`] (exatamente uma vez por
//! sentença) e os spans sobreviventes viram [`Entity`]s.
//!
//! ## Ciclo de vida adaptativo
//!
//! Após cada sentença anotada, os outcomes decodificados alimentam o estado
//! adaptativo dos geradores ([`ClearPolicy::DocumentBoundary`]), ou o estado
//! é zerado a cada sentença ([`ClearPolicy::EverySentence`]); a fronteira de
//! documento é sinalizada explicitamente por [`Annotator::start_document`].

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{SequenceValidator, TagScheme};
use crate::config::GeneratorSpec;
use crate::error::{Error, Result};
use crate::gazetteer::GazetteerMatcher;
use crate::generator::{CachedGenerator, FeatureGenerator};
use crate::lexicon::ResourceRegistry;
use crate::recognizer::NumericRecognizer;
use crate::span::{drop_overlapping, Span};

/// Saída do classificador externo: um outcome e uma probabilidade por token.
#[derive(Debug, Clone)]
pub struct ClassifierOutput {
    pub outcomes: Vec<String>,
    pub probs: Vec<f64>,
}

/// Contrato do classificador de sequência externo.
///
/// O núcleo trata o modelo treinado e seu decodificador (Viterbi, beam
/// search) como uma função opaca: recebe os tokens, os contextos de features
/// por índice e um canal lateral de pares chave-valor para contexto
/// adicional (nível de documento, por exemplo). Implementações devem
/// consultar o [`SequenceValidator`] do anotador para podar sequências de
/// tags ilegais antes de pontuá-las.
pub trait SequenceClassifier {
    fn best_sequence(
        &self,
        tokens: &[String],
        contexts: &[Vec<String>],
        additional: &HashMap<String, String>,
    ) -> Result<ClassifierOutput>;
}

/// Política de limpeza do estado adaptativo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearPolicy {
    /// Estado persiste entre sentenças; zerado só em [`Annotator::start_document`].
    #[default]
    DocumentBoundary,
    /// Estado zerado após cada sentença (cada uma é independente).
    EverySentence,
}

/// Uma entidade final, já arbitrada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Texto da entidade (tokens unidos por espaço)
    pub text: String,
    /// Rótulo (ex: "PERSON", "LOC", "NUMBER")
    pub label: String,
    /// Índice do primeiro token (inclusivo)
    pub start: usize,
    /// Índice final (exclusivo)
    pub end: usize,
    /// Confiança da fonte que produziu o span
    pub prob: f64,
}

/// Sentença rotulada para a extração de contextos de treino.
#[derive(Debug, Clone)]
pub struct LabeledSentence {
    pub tokens: Vec<String>,
    pub outcomes: Vec<String>,
}

/// O anotador de entidades nomeadas.
///
/// Possui com exclusividade o seu pipeline de geradores (e o estado
/// adaptativo dentro dele). Para anotar documentos em paralelo, construa um
/// anotador por tarefa; os dicionários e léxicos são compartilhados por
/// `Arc` e somente leitura.
pub struct Annotator<C: SequenceClassifier> {
    classifier: C,
    generator: CachedGenerator,
    scheme: TagScheme,
    validator: SequenceValidator,
    gazetteers: Vec<GazetteerMatcher>,
    numeric: Option<NumericRecognizer>,
    clear_policy: ClearPolicy,
}

impl<C: SequenceClassifier> Annotator<C> {
    pub fn new(classifier: C, generator: CachedGenerator, scheme: TagScheme) -> Self {
        Self {
            classifier,
            generator,
            scheme,
            validator: SequenceValidator::new(scheme),
            gazetteers: Vec::new(),
            numeric: None,
            clear_policy: ClearPolicy::default(),
        }
    }

    /// Acrescenta um gazetteer como fonte de spans.
    pub fn add_gazetteer(&mut self, matcher: GazetteerMatcher) {
        self.gazetteers.push(matcher);
    }

    /// Ativa o reconhecedor numérico como fonte de spans.
    pub fn set_numeric(&mut self, recognizer: NumericRecognizer) {
        self.numeric = Some(recognizer);
    }

    pub fn set_clear_policy(&mut self, policy: ClearPolicy) {
        self.clear_policy = policy;
    }

    /// Validador de adjacência, para o decodificador externo consultar.
    pub fn validator(&self) -> &SequenceValidator {
        &self.validator
    }

    /// Sinaliza fronteira de documento: zera todo estado adaptativo.
    pub fn start_document(&mut self) {
        self.generator.clear_adaptive();
    }

    /// Anota uma sentença, devolvendo a camada final de entidades
    /// (não sobrepostas, ordenadas por início).
    pub fn annotate(&mut self, tokens: &[String]) -> Result<Vec<Entity>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        // === Passo 1: contextos de features (cache novo por sentença) ===
        self.generator.advance_epoch();
        let mut contexts = Vec::with_capacity(tokens.len());
        for index in 0..tokens.len() {
            let mut features = Vec::new();
            // Na anotação nenhum outcome foi decidido ainda; o prefixo de
            // outcomes só existe no caminho de treino
            self.generator.produce(&mut features, tokens, index, &[]);
            contexts.push(features);
        }

        // === Passo 2: classificador externo ===
        let output = self
            .classifier
            .best_sequence(tokens, &contexts, &HashMap::new())?;
        if output.outcomes.len() != tokens.len() {
            return Err(Error::Classifier(format!(
                "esperados {} outcomes, recebidos {}",
                tokens.len(),
                output.outcomes.len()
            )));
        }

        // === Passo 3: decodificação dos outcomes em spans ===
        let mut spans = self.scheme.decode_with_probs(&output.outcomes, &output.probs);

        // === Passo 4: fontes independentes ===
        for matcher in &self.gazetteers {
            spans.extend(matcher.match_spans(tokens));
        }
        if let Some(recognizer) = &self.numeric {
            spans.extend(recognizer.find_spans(tokens));
        }

        // === Passo 5: arbitragem única de sobreposição ===
        let resolved = drop_overlapping(&spans);

        // === Passo 6: ciclo de vida adaptativo ===
        match self.clear_policy {
            ClearPolicy::DocumentBoundary => {
                self.generator.update_adaptive(tokens, &output.outcomes);
            }
            ClearPolicy::EverySentence => self.generator.clear_adaptive(),
        }

        debug!(
            tokens = tokens.len(),
            candidates = spans.len(),
            entities = resolved.len(),
            "sentença anotada"
        );

        Ok(resolved.into_iter().map(|s| to_entity(tokens, s)).collect())
    }
}

fn to_entity(tokens: &[String], span: Span) -> Entity {
    Entity {
        text: tokens[span.start..span.end].join(" "),
        label: span.label,
        start: span.start,
        end: span.end,
        prob: span.prob,
    }
}

/// Extrai os contextos de features de uma sentença rotulada, alimentando
/// cada índice com o prefixo de outcomes-ouro `[0, index)`, exatamente o
/// que o treino do classificador consome.
pub fn extract_contexts(
    generator: &mut CachedGenerator,
    tokens: &[String],
    outcomes: &[String],
) -> Vec<Vec<String>> {
    generator.advance_epoch();
    (0..tokens.len())
        .map(|index| {
            let mut features = Vec::new();
            generator.produce(&mut features, tokens, index, &outcomes[..index.min(outcomes.len())]);
            features
        })
        .collect()
}

/// Extrai os contextos de um corpus inteiro, sequencialmente, com um único
/// pipeline: o estado adaptativo flui de sentença a sentença na ordem do
/// corpus (reprodutível).
pub fn extract_corpus_contexts(
    sentences: &[LabeledSentence],
    spec: &GeneratorSpec,
    registry: &ResourceRegistry,
) -> Result<Vec<Vec<Vec<String>>>> {
    let mut generator = spec.build_cached(registry)?;
    let mut corpus_contexts = Vec::with_capacity(sentences.len());
    for sentence in sentences {
        let contexts = extract_contexts(&mut generator, &sentence.tokens, &sentence.outcomes);
        generator.update_adaptive(&sentence.tokens, &sentence.outcomes);
        corpus_contexts.push(contexts);
    }
    Ok(corpus_contexts)
}

/// Versão paralela da extração de corpus: um pipeline **próprio por
/// worker** (os geradores nunca são compartilhados entre threads; os
/// léxicos, somente leitura, são compartilhados por `Arc`).
///
/// # Nota
/// O estado adaptativo é atualizado na ordem de partição do rayon, não na
/// ordem do corpus. Para pipelines com geradores adaptativos, prefira a
/// versão sequencial se a reprodutibilidade exata do treino importar.
pub fn extract_corpus_contexts_parallel(
    sentences: &[LabeledSentence],
    spec: &GeneratorSpec,
    registry: &ResourceRegistry,
) -> Result<Vec<Vec<Vec<String>>>> {
    // Valida a configuração uma vez antes de abrir os workers
    spec.build_cached(registry)?;

    sentences
        .par_iter()
        .map_init(
            || spec.build_cached(registry),
            |built, sentence| match built {
                Ok(generator) => {
                    let contexts =
                        extract_contexts(generator, &sentence.tokens, &sentence.outcomes);
                    generator.update_adaptive(&sentence.tokens, &sentence.outcomes);
                    Ok(contexts)
                }
                Err(e) => Err(Error::Config(e.to_string())),
            },
        )
        .collect()
}
