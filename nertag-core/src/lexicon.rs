//! # Léxicos — Dicionários, Clusters e Registro de Recursos
//!
//! Três recursos estáticos alimentam os geradores de features e o casador de
//! gazetteer:
//!
//! - [`Dictionary`]: mapa imutável de forma de superfície (possivelmente
//!   multi-palavra) → rótulo. Formato de arquivo: uma entrada por linha,
//!   `superfície<DELIM>rótulo`, com delimitador configurável (tab para a
//!   maioria dos léxicos, `;` ou `,` para gazetteers).
//! - [`ClusterLexicon`]: mapa token → caminho de cluster (Brown/Clark/w2v),
//!   formato `token<TAB>caminho`, truncado em prefixos fixos na extração.
//! - [`ResourceRegistry`]: registro nomeado e compartilhado (somente
//!   leitura) injetado nos geradores na construção do pipeline. Nenhum
//!   estado global mutável: cada gerador recebe um `Arc` para o recurso.
//!
//! ## Tolerância a linhas malformadas
//!
//! Linhas sem delimitador ou sem rótulo são **puladas e contadas**, nunca
//! abortam o carregamento; o total pulado fica disponível para diagnóstico
//! e é registrado via `tracing`. Arquivo ausente ou ilegível, por outro
//! lado, é fatal: os geradores assumem recursos presentes.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Comprimentos de prefixo em que caminhos de cluster são truncados
/// na extração de features.
pub const CLUSTER_PREFIX_LENGTHS: [usize; 4] = [4, 6, 10, 20];

/// Mapa imutável de forma de superfície → rótulo de entidade.
///
/// Construído uma vez no carregamento e nunca mais mutado durante a
/// anotação. Chaves multi-palavra são normalizadas para palavras separadas
/// por espaço único; o maior comprimento de chave (em tokens) fica
/// registrado para limitar a janela do casador.
#[derive(Debug, Clone)]
pub struct Dictionary {
    entries: HashMap<String, String>,
    max_key_tokens: usize,
    case_sensitive: bool,
    skipped_lines: usize,
}

impl Dictionary {
    /// Carrega um dicionário de arquivo texto. Fatal se o arquivo não
    /// existir ou não puder ser lido; linhas malformadas são puladas.
    pub fn from_file(path: impl AsRef<Path>, delimiter: char, case_sensitive: bool) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);

        let mut entries = HashMap::new();
        let mut max_key_tokens = 0;
        let mut skipped_lines = 0;

        for line in reader.lines() {
            let line = line?;
            match parse_entry(&line, delimiter) {
                Some((surface, label)) => {
                    let key = normalize_key(surface, case_sensitive);
                    max_key_tokens = max_key_tokens.max(key.split(' ').count());
                    entries.insert(key, label.to_string());
                }
                None => skipped_lines += 1,
            }
        }

        if skipped_lines > 0 {
            warn!(?path, skipped_lines, "linhas malformadas puladas no dicionário");
        }
        debug!(?path, entries = entries.len(), max_key_tokens, "dicionário carregado");

        Ok(Self {
            entries,
            max_key_tokens,
            case_sensitive,
            skipped_lines,
        })
    }

    /// Constrói um dicionário em memória (testes e recursos programáticos).
    pub fn from_entries<I, K, V>(pairs: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut entries = HashMap::new();
        let mut max_key_tokens = 0;
        for (surface, label) in pairs {
            let key = normalize_key(surface.as_ref(), case_sensitive);
            max_key_tokens = max_key_tokens.max(key.split(' ').count());
            entries.insert(key, label.into());
        }
        Self {
            entries,
            max_key_tokens,
            case_sensitive,
            skipped_lines: 0,
        }
    }

    /// Consulta uma forma de superfície (já com os tokens unidos por espaço).
    pub fn lookup(&self, surface: &str) -> Option<&str> {
        if self.case_sensitive {
            self.entries.get(surface).map(String::as_str)
        } else {
            self.entries.get(&surface.to_lowercase()).map(String::as_str)
        }
    }

    /// Maior chave do dicionário, em tokens (limite da janela do casador).
    pub fn max_key_tokens(&self) -> usize {
        self.max_key_tokens
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Linhas puladas no carregamento (diagnóstico).
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}

/// Mapa token → caminho de cluster distribucional.
#[derive(Debug, Clone)]
pub struct ClusterLexicon {
    paths: HashMap<String, String>,
    skipped_lines: usize,
}

impl ClusterLexicon {
    /// Carrega um léxico de clusters (`token<TAB>caminho`, uma linha por
    /// token). Mesma política do dicionário: arquivo ausente é fatal,
    /// linha malformada é pulada e contada.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);

        let mut paths = HashMap::new();
        let mut skipped_lines = 0;

        for line in reader.lines() {
            let line = line?;
            match parse_entry(&line, '\t') {
                Some((token, cluster_path)) => {
                    paths.insert(token.to_string(), cluster_path.to_string());
                }
                None => skipped_lines += 1,
            }
        }

        if skipped_lines > 0 {
            warn!(?path, skipped_lines, "linhas malformadas puladas no léxico de clusters");
        }
        debug!(?path, tokens = paths.len(), "léxico de clusters carregado");

        Ok(Self { paths, skipped_lines })
    }

    /// Constrói um léxico em memória (testes).
    pub fn from_entries<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let paths = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            paths,
            skipped_lines: 0,
        }
    }

    /// Caminho de cluster do token, se presente. A consulta é exata e, se
    /// falhar, tenta a forma minúscula (léxicos costumam vir minusculizados).
    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.paths
            .get(token)
            .or_else(|| self.paths.get(&token.to_lowercase()))
            .map(String::as_str)
    }

    /// Prefixos do caminho de cluster nos comprimentos fixos
    /// [`CLUSTER_PREFIX_LENGTHS`], como pares `(comprimento, prefixo)`.
    ///
    /// Caminhos mais curtos que um comprimento produzem o caminho inteiro;
    /// prefixos repetidos são deduplicados (fica o menor comprimento).
    /// Token ausente produz lista vazia.
    pub fn prefixes(&self, token: &str) -> Vec<(usize, String)> {
        let Some(path) = self.lookup(token) else {
            return Vec::new();
        };
        let mut result: Vec<(usize, String)> = Vec::with_capacity(CLUSTER_PREFIX_LENGTHS.len());
        for len in CLUSTER_PREFIX_LENGTHS {
            let prefix: String = path.chars().take(len).collect();
            if result.last().map(|(_, p)| p != &prefix).unwrap_or(true) {
                result.push((len, prefix));
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}

/// Separa `superfície<DELIM>rótulo`, rejeitando campos vazios.
fn parse_entry(line: &str, delimiter: char) -> Option<(&str, &str)> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return None;
    }
    let (surface, label) = line.split_once(delimiter)?;
    let surface = surface.trim();
    let label = label.trim();
    if surface.is_empty() || label.is_empty() {
        return None;
    }
    Some((surface, label))
}

/// Normaliza a chave: palavras unidas por espaço único, minúsculas se
/// o dicionário for insensível a caixa.
fn normalize_key(surface: &str, case_sensitive: bool) -> String {
    let joined = surface.split_whitespace().collect::<Vec<_>>().join(" ");
    if case_sensitive {
        joined
    } else {
        joined.to_lowercase()
    }
}

/// Registro nomeado de recursos compartilhados entre geradores.
///
/// Os geradores recebem `Arc`s na construção (injeção explícita de
/// dependência); o registro em si só é consultado ao montar o pipeline.
/// Depois de montado, os recursos são somente leitura e seguros para
/// compartilhar entre tarefas concorrentes.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    dictionaries: HashMap<String, Arc<Dictionary>>,
    clusters: HashMap<String, Arc<ClusterLexicon>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_dictionary(&mut self, name: impl Into<String>, dictionary: Dictionary) {
        self.dictionaries.insert(name.into(), Arc::new(dictionary));
    }

    pub fn register_cluster(&mut self, name: impl Into<String>, lexicon: ClusterLexicon) {
        self.clusters.insert(name.into(), Arc::new(lexicon));
    }

    /// Recupera um dicionário pelo nome; erro se não registrado.
    pub fn dictionary(&self, name: &str) -> Result<Arc<Dictionary>> {
        self.dictionaries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingResource(format!("dicionário '{name}'")))
    }

    /// Recupera um léxico de clusters pelo nome; erro se não registrado.
    pub fn cluster(&self, name: &str) -> Result<Arc<ClusterLexicon>> {
        self.clusters
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingResource(format!("léxico de clusters '{name}'")))
    }
}
