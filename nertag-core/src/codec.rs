//! # Codec de Sequência — Esquemas BIO e BILOU
//!
//! Converte entre a representação por spans ([`Span`]) e a representação por
//! outcomes (uma tag de string por token), nos dois esquemas clássicos:
//!
//! | Esquema | Tags                                                        |
//! |---------|-------------------------------------------------------------|
//! | BIO     | `O`, `{TIPO}-start`, `{TIPO}-cont`                           |
//! | BILOU   | BIO + `{TIPO}-unit` (span de 1 token), `{TIPO}-last` (final) |
//!
//! O `{TIPO}` é um vocabulário aberto de strings (PERSON, ORG, LOC, ...).
//!
//! ## Validador de sequência
//!
//! Nem toda sequência de tags é legal: um `-cont` sem span aberto, ou de tipo
//! diferente do span aberto, é malformado. O [`SequenceValidator`] expõe essa
//! regra como um predicado booleano para o decodificador externo (beam
//! search) podar caminhos inválidos **antes** de pontuá-los. Ele nunca
//! lança erro nem panica.
//!
//! Se uma sequência malformada chegar mesmo assim à decodificação (um
//! classificador que ignorou o validador), a regra de recuperação é
//! determinística: a continuação órfã abre um span próprio do seu tipo,
//! em vez de derrubar o processo.

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Tag de token fora de qualquer entidade.
pub const OTHER: &str = "O";

/// Sufixo do primeiro token de um span.
pub const START: &str = "start";
/// Sufixo dos tokens interiores de um span.
pub const CONT: &str = "cont";
/// Sufixo do último token de um span multi-token (apenas BILOU).
pub const LAST: &str = "last";
/// Sufixo de um span de um único token (apenas BILOU).
pub const UNIT: &str = "unit";

/// Papel estrutural de um outcome dentro de um span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Start,
    Cont,
    Last,
    Unit,
    Other,
}

/// Decompõe um outcome em `(tipo, papel)`.
///
/// O sufixo é separado no **último** hífen, então tipos com hífen interno
/// ("WORK-OF-ART") são preservados. Tags sem sufixo reconhecido (inclusive
/// o próprio `O`) são tratadas como [`OutcomeKind::Other`]: a decodificação
/// é tolerante por contrato, nunca rejeita entrada.
pub fn parse_outcome(outcome: &str) -> (Option<&str>, OutcomeKind) {
    if outcome == OTHER {
        return (None, OutcomeKind::Other);
    }
    if let Some((entity_type, suffix)) = outcome.rsplit_once('-') {
        let kind = match suffix {
            START => OutcomeKind::Start,
            CONT => OutcomeKind::Cont,
            LAST => OutcomeKind::Last,
            UNIT => OutcomeKind::Unit,
            _ => return (None, OutcomeKind::Other),
        };
        if !entity_type.is_empty() {
            return (Some(entity_type), kind);
        }
    }
    (None, OutcomeKind::Other)
}

/// Esquema de codificação de spans em outcomes por token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagScheme {
    /// Begin-Inside-Outside: `-start` no primeiro token, `-cont` nos demais.
    Bio,
    /// BIO estendido com `-unit` (span unitário) e `-last` (token final).
    /// As fronteiras explícitas costumam ajudar o classificador.
    Bilou,
}

impl Default for TagScheme {
    fn default() -> Self {
        TagScheme::Bio
    }
}

impl TagScheme {
    /// Codifica spans (não sobrepostos) em um outcome por token.
    ///
    /// Spans fora do intervalo `[0, len)` são ignorados silenciosamente;
    /// a fonte de spans é responsável pelos seus próprios invariantes.
    ///
    /// # Exemplo
    /// Com BILOU, spans `[0,2) PERSON` e `[3,4) LOCATION` sobre 4 tokens:
    /// `["PERSON-start", "PERSON-last", "O", "LOCATION-unit"]`
    pub fn encode(&self, spans: &[Span], len: usize) -> Vec<String> {
        let mut outcomes = vec![OTHER.to_string(); len];
        for span in spans {
            if span.start >= span.end || span.end > len {
                continue;
            }
            match self {
                TagScheme::Bio => {
                    outcomes[span.start] = format!("{}-{START}", span.label);
                    for outcome in &mut outcomes[span.start + 1..span.end] {
                        *outcome = format!("{}-{CONT}", span.label);
                    }
                }
                TagScheme::Bilou => {
                    if span.len() == 1 {
                        outcomes[span.start] = format!("{}-{UNIT}", span.label);
                    } else {
                        outcomes[span.start] = format!("{}-{START}", span.label);
                        for outcome in &mut outcomes[span.start + 1..span.end - 1] {
                            *outcome = format!("{}-{CONT}", span.label);
                        }
                        outcomes[span.end - 1] = format!("{}-{LAST}", span.label);
                    }
                }
            }
        }
        outcomes
    }

    /// Decodifica outcomes em spans, com probabilidade 1.0.
    pub fn decode(&self, outcomes: &[String]) -> Vec<Span> {
        decode_machine(outcomes, None)
    }

    /// Decodifica outcomes anexando a cada span a média das probabilidades
    /// por token retornadas pelo classificador.
    pub fn decode_with_probs(&self, outcomes: &[String], probs: &[f64]) -> Vec<Span> {
        decode_machine(outcomes, Some(probs))
    }
}

/// Máquina de estados da decodificação, compartilhada pelos dois esquemas
/// (a decodificação aceita qualquer sufixo conhecido, independentemente do
/// esquema usado na codificação).
///
/// Estados: nenhum span aberto, ou span aberto de um tipo. Um `-start` ou
/// `-unit` abre; `O`, novo `-start` ou a fronteira `-last`/`-unit` fecha.
/// Recuperação para sequências que burlaram o validador: `-cont`/`-last`
/// órfão ou de tipo trocado fecha o span corrente (se houver) e abre um
/// span novo do próprio tipo (`-last` órfão fecha no próprio token).
fn decode_machine(outcomes: &[String], probs: Option<&[f64]>) -> Vec<Span> {
    let mut spans = Vec::new();
    // (início, tipo) do span aberto
    let mut open: Option<(usize, String)> = None;

    for (i, outcome) in outcomes.iter().enumerate() {
        let (entity_type, kind) = parse_outcome(outcome);
        match kind {
            OutcomeKind::Start => {
                close_open(&mut spans, &mut open, i, probs);
                open = entity_type.map(|t| (i, t.to_string()));
            }
            OutcomeKind::Unit => {
                close_open(&mut spans, &mut open, i, probs);
                if let Some(t) = entity_type {
                    spans.push(make_span(i, i + 1, t, probs));
                }
            }
            OutcomeKind::Cont => {
                let continues = continues_open(&open, entity_type);
                if !continues {
                    // Continuação órfã: vira início de um span próprio
                    close_open(&mut spans, &mut open, i, probs);
                    if let Some(t) = entity_type {
                        open = Some((i, t.to_string()));
                    }
                }
            }
            OutcomeKind::Last => {
                let continues = continues_open(&open, entity_type);
                close_open(&mut spans, &mut open, if continues { i + 1 } else { i }, probs);
                if !continues {
                    if let Some(t) = entity_type {
                        spans.push(make_span(i, i + 1, t, probs));
                    }
                }
            }
            OutcomeKind::Other => close_open(&mut spans, &mut open, i, probs),
        }
    }
    // Fecha o último span se a sentença terminou com ele aberto
    close_open(&mut spans, &mut open, outcomes.len(), probs);

    spans
}

/// O outcome continua o span aberto? (mesmo tipo, span existente)
fn continues_open(open: &Option<(usize, String)>, entity_type: Option<&str>) -> bool {
    matches!((open, entity_type), (Some((_, open_type)), Some(t)) if open_type == t)
}

fn close_open(spans: &mut Vec<Span>, open: &mut Option<(usize, String)>, end: usize, probs: Option<&[f64]>) {
    if let Some((start, label)) = open.take() {
        if start < end {
            spans.push(make_span(start, end, &label, probs));
        }
    }
}

fn make_span(start: usize, end: usize, label: &str, probs: Option<&[f64]>) -> Span {
    let prob = match probs {
        Some(p) if end <= p.len() => p[start..end].iter().sum::<f64>() / (end - start) as f64,
        _ => 1.0,
    };
    Span::with_prob(start, end, label, prob)
}

/// Estado do validador durante a decodificação incremental.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidatorState {
    /// Nenhum span em construção.
    #[default]
    NoOpenSpan,
    /// Span em construção, com o tipo da entidade.
    OpenSpan(String),
}

/// Valida a adjacência de tags durante a decodificação/beam search.
///
/// Regras:
/// - `{T}-start` é sempre válido (abre um span novo);
/// - `{T}-cont` só é válido com um span aberto do mesmo tipo `T`;
/// - `{T}-unit` e `{T}-last` só existem no esquema BILOU, e `-last` exige
///   span aberto do mesmo tipo;
/// - `O` é sempre válido (fecha o que estiver aberto).
///
/// O validador nunca falha: retorna `false` e deixa a poda para o
/// decodificador externo.
#[derive(Debug, Clone, Copy)]
pub struct SequenceValidator {
    scheme: TagScheme,
}

impl SequenceValidator {
    pub fn new(scheme: TagScheme) -> Self {
        Self { scheme }
    }

    /// Verifica se `candidate` é uma continuação legal a partir de `state`.
    pub fn is_valid_next(&self, state: &ValidatorState, candidate: &str) -> bool {
        let (entity_type, kind) = parse_outcome(candidate);
        match kind {
            OutcomeKind::Start | OutcomeKind::Other => true,
            OutcomeKind::Unit => self.scheme == TagScheme::Bilou,
            OutcomeKind::Cont => matches_open(state, entity_type),
            OutcomeKind::Last => self.scheme == TagScheme::Bilou && matches_open(state, entity_type),
        }
    }

    /// Avança o estado após aceitar (ou forçar) um outcome.
    ///
    /// Total por construção: mesmo um outcome inválido produz um estado
    /// coerente, espelhando a regra de recuperação da decodificação.
    pub fn advance(&self, state: &ValidatorState, outcome: &str) -> ValidatorState {
        let (entity_type, kind) = parse_outcome(outcome);
        match (kind, entity_type) {
            (OutcomeKind::Start, Some(t)) | (OutcomeKind::Cont, Some(t)) => {
                ValidatorState::OpenSpan(t.to_string())
            }
            _ => ValidatorState::NoOpenSpan,
        }
    }

    /// Forma conveniente para decodificadores que carregam o histórico
    /// completo: reconstrói o estado a partir dos outcomes anteriores.
    pub fn valid_sequence(&self, prev_outcomes: &[String], candidate: &str) -> bool {
        let state = prev_outcomes
            .iter()
            .fold(ValidatorState::NoOpenSpan, |s, o| self.advance(&s, o));
        self.is_valid_next(&state, candidate)
    }
}

fn matches_open(state: &ValidatorState, entity_type: Option<&str>) -> bool {
    match (state, entity_type) {
        (ValidatorState::OpenSpan(open_type), Some(t)) => open_type == t,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_bio_encode() {
        let spans = vec![Span::new(1, 3, "PER"), Span::new(4, 5, "LOC")];
        let encoded = TagScheme::Bio.encode(&spans, 5);
        assert_eq!(
            encoded,
            outcomes(&["O", "PER-start", "PER-cont", "O", "LOC-start"])
        );
    }

    #[test]
    fn test_bilou_encode_scenario() {
        // ["Barack","Obama","visited","Paris"] com PERSON [0,2) e LOCATION [3,4)
        let spans = vec![Span::new(0, 2, "PERSON"), Span::new(3, 4, "LOCATION")];
        let encoded = TagScheme::Bilou.encode(&spans, 4);
        assert_eq!(
            encoded,
            outcomes(&["PERSON-start", "PERSON-last", "O", "LOCATION-unit"])
        );
    }

    #[test]
    fn test_round_trip_both_schemes() {
        let spans = vec![
            Span::new(0, 1, "ORG"),
            Span::new(2, 5, "PER"),
            Span::new(6, 8, "LOC"),
        ];
        for scheme in [TagScheme::Bio, TagScheme::Bilou] {
            let decoded = scheme.decode(&scheme.encode(&spans, 8));
            assert_eq!(decoded, spans, "round-trip falhou em {scheme:?}");
        }
    }

    #[test]
    fn test_decode_adjacent_starts() {
        // Um novo -start fecha o span anterior sem precisar de O no meio
        let decoded = TagScheme::Bio.decode(&outcomes(&["PER-start", "LOC-start"]));
        assert_eq!(decoded, vec![Span::new(0, 1, "PER"), Span::new(1, 2, "LOC")]);
    }

    #[test]
    fn test_decode_open_span_at_end() {
        let decoded = TagScheme::Bio.decode(&outcomes(&["O", "PER-start", "PER-cont"]));
        assert_eq!(decoded, vec![Span::new(1, 3, "PER")]);
    }

    #[test]
    fn test_decode_recovery_orphan_cont() {
        // -cont sem span aberto abre span próprio (regra de recuperação)
        let decoded = TagScheme::Bio.decode(&outcomes(&["PER-cont", "PER-cont", "O"]));
        assert_eq!(decoded, vec![Span::new(0, 2, "PER")]);
    }

    #[test]
    fn test_decode_recovery_mismatched_cont() {
        // Troca de tipo no meio fecha o span corrente e abre outro
        let decoded = TagScheme::Bio.decode(&outcomes(&["PER-start", "LOC-cont"]));
        assert_eq!(decoded, vec![Span::new(0, 1, "PER"), Span::new(1, 2, "LOC")]);
    }

    #[test]
    fn test_decode_recovery_orphan_last() {
        // -last órfão fecha no próprio token
        let decoded = TagScheme::Bilou.decode(&outcomes(&["O", "LOC-last", "O"]));
        assert_eq!(decoded, vec![Span::new(1, 2, "LOC")]);
    }

    #[test]
    fn test_decode_with_probs_averages() {
        let tags = outcomes(&["PER-start", "PER-cont", "O", "LOC-start"]);
        let probs = [0.8, 0.6, 0.9, 0.5];
        let decoded = TagScheme::Bio.decode_with_probs(&tags, &probs);
        assert_eq!(decoded.len(), 2);
        assert!((decoded[0].prob - 0.7).abs() < 1e-9);
        assert!((decoded[1].prob - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_hyphenated_type_survives() {
        let spans = vec![Span::new(0, 2, "WORK-OF-ART")];
        let encoded = TagScheme::Bilou.encode(&spans, 2);
        assert_eq!(encoded[0], "WORK-OF-ART-start");
        assert_eq!(TagScheme::Bilou.decode(&encoded), spans);
    }

    #[test]
    fn test_validator_transitions() {
        let validator = SequenceValidator::new(TagScheme::Bio);
        let closed = ValidatorState::NoOpenSpan;
        let open_per = ValidatorState::OpenSpan("PER".to_string());

        assert!(validator.is_valid_next(&closed, "PER-start"));
        assert!(validator.is_valid_next(&closed, "O"));
        assert!(!validator.is_valid_next(&closed, "PER-cont"));
        assert!(validator.is_valid_next(&open_per, "PER-cont"));
        // Tipo trocado é inválido
        assert!(!validator.is_valid_next(&open_per, "LOC-cont"));
        // Sufixos BILOU não existem no vocabulário BIO
        assert!(!validator.is_valid_next(&closed, "PER-unit"));
        assert!(!validator.is_valid_next(&open_per, "PER-last"));
    }

    #[test]
    fn test_validator_bilou() {
        let validator = SequenceValidator::new(TagScheme::Bilou);
        let open_per = ValidatorState::OpenSpan("PER".to_string());

        assert!(validator.is_valid_next(&ValidatorState::NoOpenSpan, "PER-unit"));
        assert!(validator.is_valid_next(&open_per, "PER-last"));
        assert!(!validator.is_valid_next(&open_per, "LOC-last"));
        assert!(!validator.is_valid_next(&ValidatorState::NoOpenSpan, "PER-last"));
    }

    #[test]
    fn test_validator_advance_and_history() {
        let validator = SequenceValidator::new(TagScheme::Bilou);

        let s = validator.advance(&ValidatorState::NoOpenSpan, "PER-start");
        assert_eq!(s, ValidatorState::OpenSpan("PER".to_string()));
        let s = validator.advance(&s, "PER-last");
        assert_eq!(s, ValidatorState::NoOpenSpan);

        // Forma com histórico completo
        let prev = ["PER-start".to_string(), "PER-cont".to_string()];
        assert!(validator.valid_sequence(&prev, "PER-last"));
        assert!(!validator.valid_sequence(&prev, "LOC-cont"));
    }

    #[test]
    fn test_parse_outcome_tolerant() {
        assert_eq!(parse_outcome("O"), (None, OutcomeKind::Other));
        assert_eq!(parse_outcome("PER-start"), (Some("PER"), OutcomeKind::Start));
        // Sufixo desconhecido não derruba nada
        assert_eq!(parse_outcome("PER-xyz"), (None, OutcomeKind::Other));
        assert_eq!(parse_outcome("-start"), (None, OutcomeKind::Other));
    }
}
