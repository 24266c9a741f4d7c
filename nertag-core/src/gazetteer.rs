//! # Casador de Gazetteer — Busca de Maior Correspondência
//!
//! Percorre a sentença procurando as formas de superfície de um
//! [`Dictionary`], sempre preferindo a correspondência **mais longa**:
//! com "new" e "new york" no dicionário, a sentença "new york times"
//! produz um único span `[0, 2)`, nunca `[0, 1)`.
//!
//! A caixa (maiúsculas/minúsculas) segue o modo do dicionário: um
//! dicionário insensível casa "SÃO PAULO" com a entrada "são paulo";
//! um dicionário exato exige a forma idêntica.

use std::sync::Arc;

use crate::lexicon::Dictionary;
use crate::span::Span;

/// Casador de maior correspondência sobre um dicionário estático.
///
/// # Algoritmo
/// Para cada índice inicial `i` (esquerda para direita), estende a janela
/// candidata `[i, j)` um token por vez até o comprimento máximo de chave do
/// dicionário; a cada extensão consulta a concatenação da janela. Um acerto
/// em `j` maior **sobrescreve** acertos anteriores (vence a correspondência
/// mais longa, não a primeira). Ao fim do laço interno, se houve acerto,
/// emite o span e retoma a varredura em `matched_j`, pulando os tokens
/// consumidos, o que garante que uma única invocação nunca produz spans
/// sobrepostos. Complexidade O(n·k), k = maior chave em tokens.
#[derive(Debug, Clone)]
pub struct GazetteerMatcher {
    dictionary: Arc<Dictionary>,
}

impl GazetteerMatcher {
    pub fn new(dictionary: Arc<Dictionary>) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Encontra todos os spans do dicionário na sentença.
    ///
    /// Nunca falha: sentença vazia (ou dicionário vazio) produz lista vazia.
    pub fn match_spans(&self, tokens: &[String]) -> Vec<Span> {
        let mut spans = Vec::new();
        let max_window = self.dictionary.max_key_tokens();
        if max_window == 0 {
            return spans;
        }

        let mut i = 0;
        while i < tokens.len() {
            // (fim, rótulo) da correspondência mais longa iniciada em i
            let mut matched: Option<(usize, String)> = None;
            let mut key = String::new();

            for (j, token) in tokens
                .iter()
                .enumerate()
                .skip(i)
                .take(max_window.min(tokens.len() - i))
            {
                if !key.is_empty() {
                    key.push(' ');
                }
                key.push_str(token);
                if let Some(label) = self.dictionary.lookup(&key) {
                    matched = Some((j + 1, label.to_string()));
                }
            }

            match matched {
                Some((end, label)) => {
                    spans.push(Span::new(i, end, label));
                    i = end;
                }
                None => i += 1,
            }
        }
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Dictionary;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn matcher(entries: &[(&str, &str)], case_sensitive: bool) -> GazetteerMatcher {
        GazetteerMatcher::new(Arc::new(Dictionary::from_entries(
            entries.iter().copied(),
            case_sensitive,
        )))
    }

    #[test]
    fn test_longest_match_wins() {
        let m = matcher(&[("new", "LOC"), ("new york", "LOC")], false);
        let spans = m.match_spans(&tokens(&["new", "york", "times"]));
        // Um único span [0,2), não [0,1); a varredura retoma no índice 2
        assert_eq!(spans, vec![Span::new(0, 2, "LOC")]);
    }

    #[test]
    fn test_scan_resumes_after_consumed_window() {
        let m = matcher(&[("rio de janeiro", "LOC"), ("janeiro", "MISC")], false);
        let spans = m.match_spans(&tokens(&["rio", "de", "janeiro", "janeiro"]));
        assert_eq!(
            spans,
            vec![Span::new(0, 3, "LOC"), Span::new(3, 4, "MISC")]
        );
    }

    #[test]
    fn test_no_overlapping_spans_in_single_pass() {
        let m = matcher(&[("banco do brasil", "ORG"), ("do brasil", "MISC")], false);
        let spans = m.match_spans(&tokens(&["banco", "do", "brasil"]));
        assert_eq!(spans, vec![Span::new(0, 3, "ORG")]);
    }

    #[test]
    fn test_case_insensitive_vs_exact() {
        let insensitive = matcher(&[("são paulo", "LOC")], false);
        assert_eq!(
            insensitive.match_spans(&tokens(&["SÃO", "PAULO"])),
            vec![Span::new(0, 2, "LOC")]
        );

        let exact = matcher(&[("São Paulo", "LOC")], true);
        assert_eq!(
            exact.match_spans(&tokens(&["São", "Paulo"])),
            vec![Span::new(0, 2, "LOC")]
        );
        assert!(exact.match_spans(&tokens(&["são", "paulo"])).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        let m = matcher(&[("brasil", "LOC")], false);
        assert!(m.match_spans(&[]).is_empty());

        let empty = matcher(&[], false);
        assert!(empty.match_spans(&tokens(&["brasil"])).is_empty());
    }
}
