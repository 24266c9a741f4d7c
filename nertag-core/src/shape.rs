//! # Normalização de Forma de Token
//!
//! Converte cada token em uma "forma" canônica que descreve sua composição
//! ortográfica em vez de seu conteúdo: maiúsculas viram `X`, minúsculas viram
//! `x`, dígitos viram `d` e os demais caracteres passam intactos. Sequências
//! de 2+ marcadores idênticos são colapsadas em um único marcador seguido da
//! sentinela de quebra `#`.
//!
//! O colapso mantém o vocabulário de formas pequeno e limitado: "Petrobras",
//! "Embraer" e "Nubank" produzem todos `Xx#`, enquanto "Covid-19" produz
//! `Xx#-d#`. Isso dá ao classificador um sinal ortográfico que generaliza
//! para palavras nunca vistas no treino.
//!
//! # Exemplo
//! ```rust
//! use nertag_core::shape::normalize;
//!
//! assert_eq!(normalize("Brasil"), "Xx#");
//! assert_eq!(normalize("STF"), "X#");
//! assert_eq!(normalize("Abc1"), "Xx#d");
//! ```

/// Sentinela que marca o colapso de uma sequência de marcadores idênticos.
const RUN_BREAK: char = '#';

/// Classe ortográfica de um caractere: `X`, `x`, `d`, ou nenhuma.
fn class_of(c: char) -> Option<char> {
    if c.is_uppercase() {
        Some('X')
    } else if c.is_lowercase() {
        Some('x')
    } else if c.is_numeric() {
        Some('d')
    } else {
        None
    }
}

/// Normaliza um token para sua forma ortográfica canônica.
///
/// Determinística e sem efeitos colaterais: a mesma entrada produz sempre a
/// mesma saída, e nenhuma entrada é rejeitada (string vazia produz vazia).
///
/// # Exemplo
/// Para "OBrien99": `O` e `B` são duas maiúsculas seguidas (`X#`), "rien" é
/// uma sequência de minúsculas (`x#`) e "99" uma de dígitos (`d#`), logo a
/// forma final é `X#x#d#`.
pub fn normalize(token: &str) -> String {
    let mut shape = String::with_capacity(token.len());
    // Marcador e comprimento da sequência corrente
    let mut run: Option<(char, usize)> = None;

    for c in token.chars() {
        match (class_of(c), run) {
            (Some(marker), Some((current, len))) if marker == current => {
                run = Some((marker, len + 1));
            }
            (class, _) => {
                flush_run(&mut shape, run);
                run = match class {
                    Some(marker) => Some((marker, 1)),
                    None => {
                        shape.push(c);
                        None
                    }
                };
            }
        }
    }
    flush_run(&mut shape, run);
    shape
}

/// Emite a sequência pendente: um marcador, mais a sentinela se havia 2+.
fn flush_run(shape: &mut String, run: Option<(char, usize)>) {
    if let Some((marker, len)) = run {
        shape.push(marker);
        if len >= 2 {
            shape.push(RUN_BREAK);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_classes() {
        assert_eq!(normalize("Lula"), "Xx#");
        assert_eq!(normalize("lula"), "x#");
        assert_eq!(normalize("2023"), "d#");
        assert_eq!(normalize("-"), "-");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_run_collapse() {
        // Sequência de 2+ marcadores vira um único marcador + sentinela,
        // nunca a repetição literal
        assert_eq!(normalize("ABC"), "X#");
        assert_ne!(normalize("ABC"), "XXX");
        assert_eq!(normalize("Ab"), "Xx");
        assert_eq!(normalize("Abc1"), "Xx#d");
    }

    #[test]
    fn test_mixed_tokens_are_deterministic() {
        // Chamadas repetidas produzem sempre a mesma forma
        let a1 = normalize("McDonald's2");
        let a2 = normalize("McDonald's2");
        assert_eq!(a1, a2);
        assert_eq!(a1, "XxXx#'xd");

        let b1 = normalize("OBrien99");
        let b2 = normalize("OBrien99");
        assert_eq!(b1, b2);
        assert_eq!(b1, "X#x#d#");
    }

    #[test]
    fn test_punctuation_runs_are_not_collapsed() {
        // Apenas os marcadores de classe (X, x, d) são colapsados;
        // caracteres fora das classes passam intactos
        assert_eq!(normalize("..."), "...");
        assert_eq!(normalize("Covid-19"), "Xx#-d#");
    }

    #[test]
    fn test_unicode_aware() {
        // Acentuação do português conta como letra, não como "outro"
        assert_eq!(normalize("São"), "Xx#");
        assert_eq!(normalize("Brasília"), "Xx#");
    }
}
