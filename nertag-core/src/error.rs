//! # Erros do Núcleo
//!
//! Tipos de erro compartilhados pelo crate. A política geral:
//!
//! - **Recursos ausentes são fatais na inicialização**: os geradores assumem
//!   que dicionários e léxicos já estão em memória, então um arquivo ilegível
//!   interrompe a montagem do pipeline antes de qualquer anotação.
//! - **Linhas malformadas não são erros**: o carregador as pula e conta
//!   (ver [`crate::lexicon`]).
//! - **Configuração inválida é rejeitada na construção**, nunca durante a
//!   anotação (ex: janela de contexto com lado zero).

use thiserror::Error;

/// Alias de `Result` usado em todo o crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Erro do núcleo de anotação.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Arquivo de recurso ausente ou ilegível.
    #[error("erro de E/S ao carregar recurso: {0}")]
    Io(#[from] std::io::Error),

    /// Janela de contexto inválida: ambos os lados devem ser >= 1.
    #[error("janela de contexto inválida: left={left}, right={right} (mínimo 1 de cada lado)")]
    InvalidWindow { left: usize, right: usize },

    /// Um gerador referenciou um dicionário ou léxico não registrado.
    #[error("recurso não registrado: {0}")]
    MissingResource(String),

    /// Configuração de pipeline inválida.
    #[error("configuração inválida: {0}")]
    Config(String),

    /// JSON de configuração malformado.
    #[error("JSON de configuração malformado: {0}")]
    Json(#[from] serde_json::Error),

    /// Expressão regular inválida no reconhecedor numérico.
    #[error("padrão inválido: {0}")]
    Pattern(#[from] regex::Error),

    /// O classificador de sequência externo falhou.
    #[error("classificador de sequência falhou: {0}")]
    Classifier(String),
}
