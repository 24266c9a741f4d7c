//! # Reconhecedor Numérico por Regras
//!
//! Fonte determinística de spans para entidades numéricas: números
//! cardinais, percentuais, datas e horários. Complementa o classificador
//! estatístico com padrões de alta precisão que não dependem de treino:
//! "12/10/2023" é sempre uma data, não importa o corpus.
//!
//! Os padrões são compilados uma única vez na construção; a aplicação por
//! token nunca falha.

use regex::Regex;

use crate::error::Result;
use crate::span::Span;

/// Rótulos emitidos pelo reconhecedor.
pub const NUMBER: &str = "NUMBER";
pub const PERCENT: &str = "PERCENT";
pub const DATE: &str = "DATE";
pub const TIME: &str = "TIME";

/// Reconhecedor de entidades numéricas sobre tokens.
pub struct NumericRecognizer {
    cardinal: Regex,
    percent: Regex,
    date: Regex,
    time: Regex,
}

impl NumericRecognizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // 1.234.567,89 ou 1234567.89 ou 42
            cardinal: Regex::new(r"^\d{1,3}(\.\d{3})+(,\d+)?$|^\d+([.,]\d+)?$")?,
            // 12% ou 12,5%
            percent: Regex::new(r"^\d+([.,]\d+)?%$")?,
            // 12/10/2023, 12-10-23
            date: Regex::new(r"^\d{1,2}[/-]\d{1,2}[/-]\d{2,4}$")?,
            // 14:30 ou 14:30:59
            time: Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?$")?,
        })
    }

    /// Encontra os spans numéricos da sentença.
    ///
    /// Percorre os tokens uma vez; um percentual de dois tokens
    /// (`["12", "%"]`) consome ambos. Sentença vazia produz lista vazia.
    pub fn find_spans(&self, tokens: &[String]) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];

            // Percentual de dois tokens: cardinal seguido de "%"
            if i + 1 < tokens.len() && tokens[i + 1] == "%" && self.cardinal.is_match(token) {
                spans.push(Span::new(i, i + 2, PERCENT));
                i += 2;
                continue;
            }

            if self.date.is_match(token) {
                spans.push(Span::new(i, i + 1, DATE));
            } else if self.time.is_match(token) {
                spans.push(Span::new(i, i + 1, TIME));
            } else if self.percent.is_match(token) {
                spans.push(Span::new(i, i + 1, PERCENT));
            } else if self.cardinal.is_match(token) {
                spans.push(Span::new(i, i + 1, NUMBER));
            }
            i += 1;
        }
        spans
    }
}
