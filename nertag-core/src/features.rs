//! # Geradores Concretos de Features
//!
//! Cada gerador implementa apenas a lógica "do token corrente" do trait
//! [`FeatureGenerator`]; os efeitos de janela ficam a cargo do
//! [`crate::generator::WindowWrapper`]. As features são strings opacas na
//! convenção `nome=valor` (prefixadas por `p{d}`/`n{d}` quando replicadas
//! pela janela).
//!
//! ## Catálogo
//!
//! | Gerador                   | Feature(s)                                  |
//! |---------------------------|---------------------------------------------|
//! | [`TokenFeature`]          | `word=lula`                                 |
//! | [`TokenClassFeature`]     | `class=Xx#` (+ combinação `word&class=`)    |
//! | [`PrefixFeature`]         | `prefix1=p`, `prefix2=pe`, ...              |
//! | [`SuffixFeature`]         | `suffix1=s`, `suffix2=as`, ...              |
//! | [`CharNgramFeature`]      | `ngram=bra`, `ngram=ras`, ...               |
//! | [`BigramFeature`]         | `pw,w=o,banco`, `pc,c=x,Xx#`, ...           |
//! | [`TrigramFeature`]        | `ppw,pw,w=...`, `c,nc,nnc=...`              |
//! | [`DictionaryFeature`]     | `dict`, `dict=brasil`                       |
//! | [`ClusterFeature`]        | `cluster4=0101`, `cluster6=010110`, ...     |
//! | [`PreviousMapFeature`]    | `pd=PER-start` (adaptativo)                 |
//! | [`SentenceBoundaryFeature`] | `BOS`, `EOS`                              |
//! | [`OutcomePriorFeature`]   | `bias` (constante, em todo token)           |

use std::collections::HashMap;
use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};
use crate::gazetteer::GazetteerMatcher;
use crate::generator::FeatureGenerator;
use crate::lexicon::ClusterLexicon;
use crate::shape::normalize;

/// Texto do token, opcionalmente minusculizado.
pub struct TokenFeature {
    lowercase: bool,
}

impl TokenFeature {
    pub fn new(lowercase: bool) -> Self {
        Self { lowercase }
    }
}

impl FeatureGenerator for TokenFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        _prev_outcomes: &[String],
    ) {
        let token = &tokens[index];
        if self.lowercase {
            features.push(format!("word={}", token.to_lowercase()));
        } else {
            features.push(format!("word={token}"));
        }
    }
}

/// Forma ortográfica canônica do token (ver [`crate::shape`]).
///
/// A combinação opcional `word&class=` amarra o texto minúsculo à forma,
/// sinal útil quando a mesma palavra aparece com capitalizações distintas.
pub struct TokenClassFeature {
    word_combo: bool,
}

impl TokenClassFeature {
    pub fn new(word_combo: bool) -> Self {
        Self { word_combo }
    }
}

impl FeatureGenerator for TokenClassFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        _prev_outcomes: &[String],
    ) {
        let token = &tokens[index];
        let class = normalize(token);
        features.push(format!("class={class}"));
        if self.word_combo {
            features.push(format!("word&class={},{class}", token.to_lowercase()));
        }
    }
}

/// Prefixos do token, comprimentos `1..=max_length`, em minúsculas.
///
/// Tokens mais curtos que o comprimento pedido produzem o token inteiro
/// (repetido entre os comprimentos maiores, duplicata inofensiva).
/// Opera sobre grafemas, não bytes: "Águas" tem prefixo de 1 = "á".
pub struct PrefixFeature {
    max_length: usize,
}

impl PrefixFeature {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: max_length.max(1),
        }
    }
}

impl FeatureGenerator for PrefixFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        _prev_outcomes: &[String],
    ) {
        let lower = tokens[index].to_lowercase();
        let graphemes: Vec<&str> = lower.graphemes(true).collect();
        for n in 1..=self.max_length {
            let prefix = graphemes[..n.min(graphemes.len())].concat();
            features.push(format!("prefix{n}={prefix}"));
        }
    }
}

/// Sufixos do token, comprimentos `1..=max_length`, em minúsculas.
pub struct SuffixFeature {
    max_length: usize,
}

impl SuffixFeature {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: max_length.max(1),
        }
    }
}

impl FeatureGenerator for SuffixFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        _prev_outcomes: &[String],
    ) {
        let lower = tokens[index].to_lowercase();
        let graphemes: Vec<&str> = lower.graphemes(true).collect();
        for n in 1..=self.max_length {
            let start = graphemes.len().saturating_sub(n);
            let suffix = graphemes[start..].concat();
            features.push(format!("suffix{n}={suffix}"));
        }
    }
}

/// N-gramas de caracteres do token, comprimentos em `[min, max]`,
/// minusculizados e cientes de grafemas.
pub struct CharNgramFeature {
    min: usize,
    max: usize,
}

impl CharNgramFeature {
    /// Rejeita intervalos vazios ou com mínimo zero na construção.
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min == 0 || min > max {
            return Err(Error::Config(format!(
                "intervalo de n-gramas inválido: [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }
}

impl FeatureGenerator for CharNgramFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        _prev_outcomes: &[String],
    ) {
        let lower = tokens[index].to_lowercase();
        let graphemes: Vec<&str> = lower.graphemes(true).collect();
        for n in self.min..=self.max.min(graphemes.len()) {
            for window in graphemes.windows(n) {
                features.push(format!("ngram={}", window.concat()));
            }
        }
    }
}

/// Bigramas de token e de forma com os vizinhos imediatos.
pub struct BigramFeature;

impl FeatureGenerator for BigramFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        _prev_outcomes: &[String],
    ) {
        let word = tokens[index].to_lowercase();
        let class = normalize(&tokens[index]);

        if index > 0 {
            let prev = &tokens[index - 1];
            features.push(format!("pw,w={},{word}", prev.to_lowercase()));
            features.push(format!("pc,c={},{class}", normalize(prev)));
        }
        if index + 1 < tokens.len() {
            let next = &tokens[index + 1];
            features.push(format!("w,nw={word},{}", next.to_lowercase()));
            features.push(format!("c,nc={class},{}", normalize(next)));
        }
    }
}

/// Trigramas de token e de forma (dois vizinhos de cada lado).
pub struct TrigramFeature;

impl FeatureGenerator for TrigramFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        _prev_outcomes: &[String],
    ) {
        let word = tokens[index].to_lowercase();
        let class = normalize(&tokens[index]);

        if index > 1 {
            let p2 = &tokens[index - 2];
            let p1 = &tokens[index - 1];
            features.push(format!(
                "ppw,pw,w={},{},{word}",
                p2.to_lowercase(),
                p1.to_lowercase()
            ));
            features.push(format!("ppc,pc,c={},{},{class}", normalize(p2), normalize(p1)));
        }
        if index + 2 < tokens.len() {
            let n1 = &tokens[index + 1];
            let n2 = &tokens[index + 2];
            features.push(format!(
                "w,nw,nnw={word},{},{}",
                n1.to_lowercase(),
                n2.to_lowercase()
            ));
            features.push(format!("c,nc,nnc={class},{},{}", normalize(n1), normalize(n2)));
        }
    }
}

/// Pertencimento do token a um span do dicionário dentro da sentença.
///
/// Delega ao [`GazetteerMatcher`]: se o índice corrente cair dentro de
/// algum span casado, emite o marcador fixo e o marcador amarrado ao token.
/// O casamento é O(n·k) por chamada; o cache por sentença do pipeline
/// limita o custo a uma chamada por índice.
pub struct DictionaryFeature {
    matcher: GazetteerMatcher,
    marker: String,
}

impl DictionaryFeature {
    pub fn new(matcher: GazetteerMatcher) -> Self {
        Self::with_marker(matcher, "dict")
    }

    /// Marcador customizado, para distinguir múltiplos dicionários no
    /// mesmo pipeline (ex: `gaz_loc`, `gaz_org`).
    pub fn with_marker(matcher: GazetteerMatcher, marker: impl Into<String>) -> Self {
        Self {
            matcher,
            marker: marker.into(),
        }
    }
}

impl FeatureGenerator for DictionaryFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        _prev_outcomes: &[String],
    ) {
        let spans = self.matcher.match_spans(tokens);
        if spans.iter().any(|s| s.start <= index && index < s.end) {
            features.push(self.marker.clone());
            features.push(format!(
                "{}={}",
                self.marker,
                tokens[index].to_lowercase()
            ));
        }
    }
}

/// Prefixos do caminho de cluster do token (ver [`ClusterLexicon`]).
/// Token fora do léxico não emite nada.
pub struct ClusterFeature {
    lexicon: Arc<ClusterLexicon>,
}

impl ClusterFeature {
    pub fn new(lexicon: Arc<ClusterLexicon>) -> Self {
        Self { lexicon }
    }
}

impl FeatureGenerator for ClusterFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        _prev_outcomes: &[String],
    ) {
        for (len, prefix) in self.lexicon.prefixes(&tokens[index]) {
            features.push(format!("cluster{len}={prefix}"));
        }
    }
}

/// Mapa adaptativo de outcomes anteriores.
///
/// Lembra, da última sentença completamente rotulada, qual outcome seguiu
/// cada forma de superfície, e o reemite como feature quando o mesmo token
/// reaparece: um sinal fraco de coerência entre sentenças do documento
/// ("Petrobras foi ORG duas frases atrás, provavelmente é ORG de novo").
///
/// O estado pertence à instância e é zerado em [`FeatureGenerator::clear_adaptive`]
/// na fronteira de documento.
pub struct PreviousMapFeature {
    previous: HashMap<String, String>,
}

impl PreviousMapFeature {
    pub fn new() -> Self {
        Self {
            previous: HashMap::new(),
        }
    }
}

impl Default for PreviousMapFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureGenerator for PreviousMapFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        _prev_outcomes: &[String],
    ) {
        if let Some(outcome) = self.previous.get(&tokens[index]) {
            features.push(format!("pd={outcome}"));
        }
    }

    fn update_adaptive(&mut self, tokens: &[String], outcomes: &[String]) {
        for (token, outcome) in tokens.iter().zip(outcomes) {
            self.previous.insert(token.clone(), outcome.clone());
        }
    }

    fn clear_adaptive(&mut self) {
        self.previous.clear();
    }
}

/// Marcadores de fronteira de sentença (`BOS` no primeiro token,
/// `EOS` no último).
pub struct SentenceBoundaryFeature {
    begin: bool,
    end: bool,
}

impl SentenceBoundaryFeature {
    pub fn new(begin: bool, end: bool) -> Self {
        Self { begin, end }
    }
}

impl FeatureGenerator for SentenceBoundaryFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        _prev_outcomes: &[String],
    ) {
        if self.begin && index == 0 {
            features.push("BOS".to_string());
        }
        if self.end && index + 1 == tokens.len() {
            features.push("EOS".to_string());
        }
    }
}

/// Feature constante presente em todo token: o termo de viés do
/// classificador, que captura a distribuição a priori dos outcomes.
pub struct OutcomePriorFeature;

impl FeatureGenerator for OutcomePriorFeature {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        _tokens: &[String],
        _index: usize,
        _prev_outcomes: &[String],
    ) {
        features.push("bias".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Dictionary;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn produce(generator: &mut dyn FeatureGenerator, sentence: &[String], index: usize) -> Vec<String> {
        let mut features = Vec::new();
        generator.produce(&mut features, sentence, index, &[]);
        features
    }

    #[test]
    fn test_token_feature_lowercase_modes() {
        let sentence = tokens(&["Brasília"]);
        assert_eq!(
            produce(&mut TokenFeature::new(true), &sentence, 0),
            vec!["word=brasília"]
        );
        assert_eq!(
            produce(&mut TokenFeature::new(false), &sentence, 0),
            vec!["word=Brasília"]
        );
    }

    #[test]
    fn test_token_class_with_combo() {
        let sentence = tokens(&["Petrobras"]);
        assert_eq!(
            produce(&mut TokenClassFeature::new(true), &sentence, 0),
            vec!["class=Xx#", "word&class=petrobras,Xx#"]
        );
    }

    #[test]
    fn test_affixes_truncate_at_token_length() {
        let sentence = tokens(&["Rio"]);
        assert_eq!(
            produce(&mut PrefixFeature::new(4), &sentence, 0),
            vec!["prefix1=r", "prefix2=ri", "prefix3=rio", "prefix4=rio"]
        );
        assert_eq!(
            produce(&mut SuffixFeature::new(4), &sentence, 0),
            vec!["suffix1=o", "suffix2=io", "suffix3=rio", "suffix4=rio"]
        );
    }

    #[test]
    fn test_char_ngram_range() {
        let sentence = tokens(&["Casa"]);
        let mut gen = CharNgramFeature::new(2, 3).expect("intervalo válido");
        assert_eq!(
            produce(&mut gen, &sentence, 0),
            vec!["ngram=ca", "ngram=as", "ngram=sa", "ngram=cas", "ngram=asa"]
        );
        // Intervalo inválido é erro de configuração
        assert!(CharNgramFeature::new(0, 3).is_err());
        assert!(CharNgramFeature::new(4, 2).is_err());
    }

    #[test]
    fn test_bigram_boundaries() {
        let sentence = tokens(&["O", "banco", "fechou"]);
        // Primeiro token: só bigramas à direita
        assert_eq!(
            produce(&mut BigramFeature, &sentence, 0),
            vec!["w,nw=o,banco", "c,nc=X,x#"]
        );
        // Token do meio: ambos os lados
        assert_eq!(produce(&mut BigramFeature, &sentence, 1).len(), 4);
    }

    #[test]
    fn test_trigram_needs_two_neighbors() {
        let sentence = tokens(&["a", "b", "c", "d", "e"]);
        assert!(produce(&mut TrigramFeature, &sentence, 1).len() == 2);
        assert!(produce(&mut TrigramFeature, &sentence, 2).len() == 4);
    }

    #[test]
    fn test_dictionary_feature_markers() {
        let dict = Arc::new(Dictionary::from_entries([("banco do brasil", "ORG")], false));
        let mut gen = DictionaryFeature::new(GazetteerMatcher::new(dict));
        let sentence = tokens(&["O", "Banco", "do", "Brasil", "fechou"]);

        // Token dentro do span casado: marcador fixo + marcador=token
        assert_eq!(
            produce(&mut gen, &sentence, 2),
            vec!["dict", "dict=do"]
        );
        // Fora do span: nada
        assert!(produce(&mut gen, &sentence, 0).is_empty());
        assert!(produce(&mut gen, &sentence, 4).is_empty());
    }

    #[test]
    fn test_cluster_feature_prefix_lengths() {
        let lexicon = Arc::new(ClusterLexicon::from_entries([("banco", "010110110101")]));
        let mut gen = ClusterFeature::new(lexicon);
        let sentence = tokens(&["banco"]);
        assert_eq!(
            produce(&mut gen, &sentence, 0),
            vec![
                "cluster4=0101",
                "cluster6=010110",
                "cluster10=0101101101",
                "cluster20=010110110101",
            ]
        );
        assert!(produce(&mut gen, &tokens(&["xyz"]), 0).is_empty());
    }

    #[test]
    fn test_previous_map_lifecycle() {
        let mut gen = PreviousMapFeature::new();
        let first = tokens(&["Petrobras", "anunciou"]);
        let outcomes = vec!["ORG-unit".to_string(), "O".to_string()];

        // Antes de qualquer update: nada a emitir
        assert!(produce(&mut gen, &first, 0).is_empty());

        gen.update_adaptive(&first, &outcomes);
        let second = tokens(&["A", "Petrobras", "subiu"]);
        assert_eq!(produce(&mut gen, &second, 1), vec!["pd=ORG-unit"]);

        // Fronteira de documento zera o mapa
        gen.clear_adaptive();
        assert!(produce(&mut gen, &second, 1).is_empty());
    }

    #[test]
    fn test_sentence_boundary_markers() {
        let mut gen = SentenceBoundaryFeature::new(true, true);
        let sentence = tokens(&["Lula", "viajou", "ontem"]);
        assert_eq!(produce(&mut gen, &sentence, 0), vec!["BOS"]);
        assert!(produce(&mut gen, &sentence, 1).is_empty());
        assert_eq!(produce(&mut gen, &sentence, 2), vec!["EOS"]);

        // Sentença de um token é início e fim ao mesmo tempo
        let single = tokens(&["Oi"]);
        assert_eq!(produce(&mut gen, &single, 0), vec!["BOS", "EOS"]);
    }

    #[test]
    fn test_outcome_prior_is_constant() {
        let sentence = tokens(&["a", "b"]);
        assert_eq!(produce(&mut OutcomePriorFeature, &sentence, 0), vec!["bias"]);
        assert_eq!(produce(&mut OutcomePriorFeature, &sentence, 1), vec!["bias"]);
    }
}
