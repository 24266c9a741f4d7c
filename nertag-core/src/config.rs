//! # Configuração Declarativa do Pipeline
//!
//! Em vez de uma hierarquia de classes por feature, o pipeline de geradores
//! é descrito por um valor serializável ([`GeneratorSpec`]) e montado de uma
//! vez contra o [`ResourceRegistry`]. Isso deixa a composição (quais
//! geradores, em que ordem, com que janela) fora do código, em JSON:
//!
//! ```json
//! {
//!   "type": "aggregate",
//!   "children": [
//!     { "type": "window", "left": 2, "right": 2,
//!       "inner": { "type": "token", "lowercase": true } },
//!     { "type": "dictionary", "resource": "paises" },
//!     { "type": "outcome_prior" }
//!   ]
//! }
//! ```
//!
//! Erros de configuração (janela com lado zero, recurso não registrado,
//! intervalo de n-gramas vazio) são detectados na montagem, nunca durante
//! a anotação.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::features::{
    BigramFeature, CharNgramFeature, ClusterFeature, DictionaryFeature, OutcomePriorFeature,
    PrefixFeature, PreviousMapFeature, SentenceBoundaryFeature, SuffixFeature, TokenClassFeature,
    TokenFeature, TrigramFeature,
};
use crate::gazetteer::GazetteerMatcher;
use crate::generator::{AggregatedGenerator, CachedGenerator, FeatureGenerator, WindowWrapper};
use crate::lexicon::ResourceRegistry;

fn default_true() -> bool {
    true
}

fn default_affix_length() -> usize {
    4
}

fn default_marker() -> String {
    "dict".to_string()
}

/// Descrição declarativa de um gerador (ou árvore de geradores).
///
/// Cada variante corresponde a um gerador concreto de [`crate::features`],
/// mais os dois nós estruturais `window` e `aggregate`. O [`CachedGenerator`]
/// não aparece aqui: o cache envolve sempre a raiz, via [`GeneratorSpec::build_cached`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorSpec {
    /// Texto do token ([`TokenFeature`]).
    Token {
        #[serde(default = "default_true")]
        lowercase: bool,
    },
    /// Forma ortográfica ([`TokenClassFeature`]).
    TokenClass {
        #[serde(default)]
        word_combo: bool,
    },
    /// Prefixos de 1..=max ([`PrefixFeature`]).
    Prefix {
        #[serde(default = "default_affix_length")]
        max_length: usize,
    },
    /// Sufixos de 1..=max ([`SuffixFeature`]).
    Suffix {
        #[serde(default = "default_affix_length")]
        max_length: usize,
    },
    /// N-gramas de caracteres em `[min, max]` ([`CharNgramFeature`]).
    CharNgram { min: usize, max: usize },
    /// Bigramas de token/forma com vizinhos ([`BigramFeature`]).
    Bigram,
    /// Trigramas de token/forma ([`TrigramFeature`]).
    Trigram,
    /// Pertencimento a dicionário ([`DictionaryFeature`]); `resource` é o
    /// nome registrado no [`ResourceRegistry`].
    Dictionary {
        resource: String,
        #[serde(default = "default_marker")]
        marker: String,
    },
    /// Prefixos de caminho de cluster ([`ClusterFeature`]).
    Cluster { resource: String },
    /// Mapa adaptativo de outcomes ([`PreviousMapFeature`]).
    PreviousMap,
    /// Marcadores BOS/EOS ([`SentenceBoundaryFeature`]).
    SentenceBoundary {
        #[serde(default = "default_true")]
        begin: bool,
        #[serde(default = "default_true")]
        end: bool,
    },
    /// Viés constante ([`OutcomePriorFeature`]).
    OutcomePrior,
    /// Janela de contexto em volta de um gerador interno.
    Window {
        left: usize,
        right: usize,
        inner: Box<GeneratorSpec>,
    },
    /// Lista ordenada de geradores.
    Aggregate { children: Vec<GeneratorSpec> },
}

impl GeneratorSpec {
    /// Monta o gerador descrito, resolvendo recursos pelo registro.
    pub fn build(&self, registry: &ResourceRegistry) -> Result<Box<dyn FeatureGenerator>> {
        Ok(match self {
            GeneratorSpec::Token { lowercase } => Box::new(TokenFeature::new(*lowercase)),
            GeneratorSpec::TokenClass { word_combo } => {
                Box::new(TokenClassFeature::new(*word_combo))
            }
            GeneratorSpec::Prefix { max_length } => Box::new(PrefixFeature::new(*max_length)),
            GeneratorSpec::Suffix { max_length } => Box::new(SuffixFeature::new(*max_length)),
            GeneratorSpec::CharNgram { min, max } => Box::new(CharNgramFeature::new(*min, *max)?),
            GeneratorSpec::Bigram => Box::new(BigramFeature),
            GeneratorSpec::Trigram => Box::new(TrigramFeature),
            GeneratorSpec::Dictionary { resource, marker } => {
                let dictionary = registry.dictionary(resource)?;
                Box::new(DictionaryFeature::with_marker(
                    GazetteerMatcher::new(dictionary),
                    marker.clone(),
                ))
            }
            GeneratorSpec::Cluster { resource } => {
                Box::new(ClusterFeature::new(registry.cluster(resource)?))
            }
            GeneratorSpec::PreviousMap => Box::new(PreviousMapFeature::new()),
            GeneratorSpec::SentenceBoundary { begin, end } => {
                Box::new(SentenceBoundaryFeature::new(*begin, *end))
            }
            GeneratorSpec::OutcomePrior => Box::new(OutcomePriorFeature),
            GeneratorSpec::Window { left, right, inner } => {
                Box::new(WindowWrapper::new(inner.build(registry)?, *left, *right)?)
            }
            GeneratorSpec::Aggregate { children } => {
                let built: Result<Vec<_>> =
                    children.iter().map(|child| child.build(registry)).collect();
                Box::new(AggregatedGenerator::new(built?))
            }
        })
    }

    /// Monta como agregação (raiz canônica do pipeline): uma descrição que
    /// não seja `aggregate` vira agregação de um único filho.
    pub fn build_aggregated(&self, registry: &ResourceRegistry) -> Result<AggregatedGenerator> {
        match self {
            GeneratorSpec::Aggregate { children } => {
                let built: Result<Vec<_>> =
                    children.iter().map(|child| child.build(registry)).collect();
                Ok(AggregatedGenerator::new(built?))
            }
            other => Ok(AggregatedGenerator::new(vec![other.build(registry)?])),
        }
    }

    /// Monta o pipeline completo, com o cache por sentença na raiz.
    pub fn build_cached(&self, registry: &ResourceRegistry) -> Result<CachedGenerator> {
        Ok(CachedGenerator::new(self.build_aggregated(registry)?))
    }

    /// Pipeline padrão, sem recursos externos: janela (2,2) de texto+forma,
    /// afixos, bigramas, fronteiras de sentença e viés.
    pub fn default_pipeline() -> GeneratorSpec {
        GeneratorSpec::Aggregate {
            children: vec![
                GeneratorSpec::Window {
                    left: 2,
                    right: 2,
                    inner: Box::new(GeneratorSpec::Aggregate {
                        children: vec![
                            GeneratorSpec::Token { lowercase: true },
                            GeneratorSpec::TokenClass { word_combo: true },
                        ],
                    }),
                },
                GeneratorSpec::Prefix { max_length: 4 },
                GeneratorSpec::Suffix { max_length: 4 },
                GeneratorSpec::Bigram,
                GeneratorSpec::SentenceBoundary {
                    begin: true,
                    end: true,
                },
                GeneratorSpec::OutcomePrior,
            ],
        }
    }
}

/// Monta um pipeline a partir da descrição JSON.
pub fn pipeline_from_json(json: &str, registry: &ResourceRegistry) -> Result<CachedGenerator> {
    let spec: GeneratorSpec = serde_json::from_str(json)?;
    spec.build_cached(registry)
}
