//! # Spans de Entidade e Arbitragem de Sobreposição
//!
//! Um [`Span`] é um intervalo semiaberto de índices de token `[start, end)`
//! com um rótulo de entidade e uma probabilidade opcional de decodificação.
//! Spans chegam de fontes independentes (classificador estatístico,
//! gazetteers, reconhecedor numérico) e precisam ser fundidos em uma única
//! camada de anotação **sem sobreposições**.
//!
//! ## Por que um único ponto de arbitragem?
//!
//! Cada fonte produz spans internamente consistentes, mas nada garante
//! consistência *entre* fontes ("Banco do Brasil" pelo gazetteer vs "Brasil"
//! pelo classificador). A função [`drop_overlapping`] é o único ponto do
//! sistema onde esse conflito é resolvido, e deve ser chamada exatamente uma
//! vez por sentença, depois que todas as fontes contribuíram.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Um intervalo de tokens `[start, end)` rotulado com um tipo de entidade.
///
/// Invariantes: `start < end` (spans vazios não existem). O rótulo é um
/// vocabulário aberto de strings (ex: "PERSON", "LOC", "NUMBER").
///
/// # Exemplo
/// Em `["Banco", "do", "Brasil", "anunciou"]`, a entidade "Banco do Brasil":
/// `Span { start: 0, end: 3, label: "ORG", prob: 1.0 }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Índice do token inicial (inclusivo)
    pub start: usize,
    /// Índice do token final (exclusivo)
    pub end: usize,
    /// Rótulo da entidade (ex: "PERSON", "ORG")
    pub label: String,
    /// Confiança atribuída na decodificação (fontes determinísticas usam 1.0)
    pub prob: f64,
}

impl Span {
    /// Cria um span com probabilidade 1.0 (fontes determinísticas).
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        debug_assert!(start < end, "span vazio: [{start}, {end})");
        Self {
            start,
            end,
            label: label.into(),
            prob: 1.0,
        }
    }

    /// Cria um span com probabilidade de decodificação.
    pub fn with_prob(start: usize, end: usize, label: impl Into<String>, prob: f64) -> Self {
        let mut span = Self::new(start, end, label);
        span.prob = prob;
        span
    }

    /// Número de tokens cobertos.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Um span nunca é vazio pelo invariante, mas o nome é convencional.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Verifica interseção de índices (qualquer sobreposição, não só contenção).
    pub fn intersects(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Verifica se este span contém integralmente o outro.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Ordem total usada pela arbitragem de sobreposição.
///
/// Critérios, nesta ordem:
/// 1. `start` menor primeiro;
/// 2. probabilidade maior primeiro;
/// 3. span mais longo primeiro (`end` maior);
/// 4. rótulo em ordem lexicográfica (desempate final, só para determinismo).
fn compare_priority(a: &Span, b: &Span) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| b.prob.partial_cmp(&a.prob).unwrap_or(Ordering::Equal))
        .then_with(|| b.end.cmp(&a.end))
        .then_with(|| a.label.cmp(&b.label))
}

/// Remove spans sobrepostos, mantendo o de maior prioridade em cada conflito.
///
/// Algoritmo: ordenação estável pela ordem total acima, seguida de uma
/// varredura esquerda-direita que mantém o último span aceito (`last_kept`)
/// e descarta qualquer span que o intersecte. Dentro de um agrupamento de
/// spans mutuamente sobrepostos, sobrevive o primeiro na ordem, e todos os
/// que o intersectam são descartados em uma única passada.
///
/// # Nota
/// É uma aproximação gulosa, não uma solução ótima de conjunto independente
/// de peso máximo: um span de alta probabilidade pode "sombrear" dois spans
/// menores que juntos cobririam mais tokens. O ganho é previsibilidade e
/// custo O(n log n).
///
/// A função é idempotente: aplicá-la sobre a própria saída não muda nada.
/// Entrada vazia produz saída vazia.
pub fn drop_overlapping(spans: &[Span]) -> Vec<Span> {
    let mut ordered: Vec<Span> = spans.to_vec();
    ordered.sort_by(compare_priority);

    let mut kept: Vec<Span> = Vec::with_capacity(ordered.len());
    for span in ordered {
        match kept.last() {
            // Como a lista está ordenada por start, um span novo só pode
            // intersectar o último aceito
            Some(last_kept) if last_kept.intersects(&span) => continue,
            _ => kept.push(span),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects() {
        let a = Span::new(0, 2, "PER");
        let b = Span::new(1, 3, "LOC");
        let c = Span::new(2, 4, "LOC");
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        // Intervalos semiabertos: [0,2) e [2,4) não se tocam
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_non_overlapping_pass_through() {
        let spans = vec![Span::new(3, 4, "LOC"), Span::new(0, 2, "PER")];
        let resolved = drop_overlapping(&spans);
        assert_eq!(resolved.len(), 2);
        // Saída ordenada por início
        assert_eq!(resolved[0].start, 0);
        assert_eq!(resolved[1].start, 3);
    }

    #[test]
    fn test_overlap_keeps_higher_probability() {
        let spans = vec![
            Span::with_prob(0, 2, "PER", 0.6),
            Span::with_prob(0, 3, "ORG", 0.9),
        ];
        let resolved = drop_overlapping(&spans);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].label, "ORG");
    }

    #[test]
    fn test_equal_probability_prefers_longer() {
        let spans = vec![Span::new(0, 1, "LOC"), Span::new(0, 2, "LOC")];
        let resolved = drop_overlapping(&spans);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].end, 2);
    }

    #[test]
    fn test_transitive_cluster_resolved_in_one_pass() {
        // b intersecta a, c intersecta b mas não a: o agrupamento é
        // resolvido em relação ao último mantido, então c sobrevive
        let spans = vec![
            Span::new(0, 3, "A"),
            Span::new(2, 5, "B"),
            Span::new(4, 6, "C"),
        ];
        let resolved = drop_overlapping(&spans);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].label, "A");
        assert_eq!(resolved[1].label, "C");
    }

    #[test]
    fn test_idempotence() {
        let spans = vec![
            Span::with_prob(0, 2, "PER", 0.8),
            Span::with_prob(1, 4, "ORG", 0.7),
            Span::new(5, 6, "LOC"),
            Span::with_prob(5, 7, "MISC", 0.2),
        ];
        let once = drop_overlapping(&spans);
        let twice = drop_overlapping(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(drop_overlapping(&[]).is_empty());
    }
}
