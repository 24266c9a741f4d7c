//! # Arcabouço de Geradores de Features
//!
//! Um gerador de features transforma `(tokens, índice, outcomes anteriores)`
//! em uma lista de strings opacas consumidas pelo classificador de
//! sequência. O arcabouço separa dois papéis:
//!
//! - **Geradores concretos** ([`crate::features`]): cada um implementa só a
//!   lógica "do token corrente" (texto, forma, afixos, dicionário...).
//! - **Decoradores estruturais** (este módulo): composição em lista
//!   ([`AggregatedGenerator`]), replicação em janela de contexto
//!   ([`WindowWrapper`]) e memoização por sentença ([`CachedGenerator`]).
//!
//! ## Estado adaptativo
//!
//! Alguns geradores lembram o que viram nas sentenças anteriores do mesmo
//! documento (ex: o outcome atribuído a cada forma de superfície). Esse
//! estado pertence **exclusivamente** à instância do gerador: é alimentado
//! por [`FeatureGenerator::update_adaptive`] após cada sentença rotulada e
//! zerado por [`FeatureGenerator::clear_adaptive`] na fronteira de
//! documento. Tarefas concorrentes devem possuir cada uma o seu próprio
//! pipeline de geradores; os léxicos compartilhados são somente leitura.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Capacidade padrão do cache por sentença do [`CachedGenerator`].
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Um gerador de features componível.
///
/// As features são acumuladas em uma lista ordenada e tolerante a
/// duplicatas: a ordem importa para a reprodutibilidade do treino, e
/// duplicatas são inofensivas para o classificador.
pub trait FeatureGenerator {
    /// Produz features para o token em `index`, anexando-as a `features`.
    ///
    /// `prev_outcomes` carrega os outcomes já decididos da sentença corrente
    /// (prefixo `[0, index)`); no treino são os outcomes-ouro, na anotação a
    /// lista pode estar vazia.
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        prev_outcomes: &[String],
    );

    /// Consome uma sentença completamente rotulada para atualizar o estado
    /// adaptativo. Geradores sem estado herdam o no-op.
    fn update_adaptive(&mut self, _tokens: &[String], _outcomes: &[String]) {}

    /// Zera o estado adaptativo (fronteira de documento).
    fn clear_adaptive(&mut self) {}
}

/// Executa uma lista ordenada de geradores, concatenando as saídas.
///
/// A ordem dos filhos é preservada na saída: reordenar filhos muda a
/// sequência de features e, portanto, o modelo treinado. As chamadas de
/// `update_adaptive`/`clear_adaptive` são repassadas a **todos** os filhos,
/// incondicionalmente (no-op para os sem estado).
pub struct AggregatedGenerator {
    children: Vec<Box<dyn FeatureGenerator>>,
}

impl AggregatedGenerator {
    pub fn new(children: Vec<Box<dyn FeatureGenerator>>) -> Self {
        Self { children }
    }

    pub fn push(&mut self, child: Box<dyn FeatureGenerator>) {
        self.children.push(child);
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl FeatureGenerator for AggregatedGenerator {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        prev_outcomes: &[String],
    ) {
        for child in &mut self.children {
            child.produce(features, tokens, index, prev_outcomes);
        }
    }

    fn update_adaptive(&mut self, tokens: &[String], outcomes: &[String]) {
        for child in &mut self.children {
            child.update_adaptive(tokens, outcomes);
        }
    }

    fn clear_adaptive(&mut self) {
        for child in &mut self.children {
            child.clear_adaptive();
        }
    }
}

/// Replica um gerador sobre uma janela de contexto `(left, right)`.
///
/// Para o índice corrente emite primeiro a saída do gerador interno sem
/// prefixo; depois, para cada distância `d` em `1..=left`, reexecuta o
/// gerador em `index - d` e reemite cada feature com o prefixo `p{d}`;
/// simetricamente à direita com `n{d}`. É assim que efeitos de
/// "bigrama/trigrama de vizinhos" são obtidos genericamente, sem
/// codificá-los feature a feature.
///
/// Índices de borda produzem menos features que os interiores (as posições
/// fora da sentença são simplesmente omitidas), nunca mais.
pub struct WindowWrapper {
    inner: Box<dyn FeatureGenerator>,
    left: usize,
    right: usize,
    scratch: Vec<String>,
}

impl WindowWrapper {
    /// Cria a janela. `left` e `right` devem ser ambos >= 1; uma janela
    /// com lado zero é um erro de configuração, rejeitado na construção.
    pub fn new(inner: Box<dyn FeatureGenerator>, left: usize, right: usize) -> Result<Self> {
        if left < 1 || right < 1 {
            return Err(Error::InvalidWindow { left, right });
        }
        Ok(Self {
            inner,
            left,
            right,
            scratch: Vec::new(),
        })
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn right(&self) -> usize {
        self.right
    }
}

impl FeatureGenerator for WindowWrapper {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        prev_outcomes: &[String],
    ) {
        // Posição corrente, sem prefixo
        self.inner.produce(features, tokens, index, prev_outcomes);

        // Contexto à esquerda: p1, p2, ...
        for d in 1..=self.left {
            let Some(i) = index.checked_sub(d) else { break };
            self.scratch.clear();
            self.inner.produce(&mut self.scratch, tokens, i, prev_outcomes);
            features.extend(self.scratch.drain(..).map(|f| format!("p{d}{f}")));
        }

        // Contexto à direita: n1, n2, ...
        for d in 1..=self.right {
            let i = index + d;
            if i >= tokens.len() {
                break;
            }
            self.scratch.clear();
            self.inner.produce(&mut self.scratch, tokens, i, prev_outcomes);
            features.extend(self.scratch.drain(..).map(|f| format!("n{d}{f}")));
        }
    }

    fn update_adaptive(&mut self, tokens: &[String], outcomes: &[String]) {
        self.inner.update_adaptive(tokens, outcomes);
    }

    fn clear_adaptive(&mut self) {
        self.inner.clear_adaptive();
    }
}

/// Memoiza a saída do pipeline agregado por índice, dentro de uma sentença.
///
/// O decodificador externo consulta o mesmo índice várias vezes durante o
/// beam search; recomputar a agregação inteira a cada consulta seria o
/// custo dominante. O cache é válido **apenas durante o processamento de
/// uma sentença**: a chave é um contador explícito de época que o chamador
/// avança uma vez por sentença via [`CachedGenerator::advance_epoch`],
/// nunca a identidade ou o conteúdo da lista de tokens.
///
/// Como rede de segurança, uma mudança no comprimento da sentença dentro da
/// mesma época força o avanço automático; ainda assim o contrato do
/// chamador é avançar a época a cada sentença nova.
///
/// A memoização pressupõe que os geradores internos não dependem de
/// `prev_outcomes`: geradores sensíveis ao prefixo de outcomes devem ficar
/// fora do cache, ou a primeira consulta de cada índice seria congelada.
pub struct CachedGenerator {
    inner: AggregatedGenerator,
    cache: HashMap<usize, Vec<String>>,
    capacity: usize,
    epoch: u64,
    sentence_len: Option<usize>,
    hits: u64,
    misses: u64,
}

impl CachedGenerator {
    pub fn new(inner: AggregatedGenerator) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: AggregatedGenerator, capacity: usize) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
            capacity: capacity.max(1),
            epoch: 0,
            sentence_len: None,
            hits: 0,
            misses: 0,
        }
    }

    /// Inicia uma nova época de cache (uma por sentença).
    pub fn advance_epoch(&mut self) {
        self.epoch += 1;
        self.cache.clear();
        self.sentence_len = None;
    }

    /// Época corrente (identifica a sentença em processamento).
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Consultas servidas pelo cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Consultas que exigiram recomputação.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl FeatureGenerator for CachedGenerator {
    fn produce(
        &mut self,
        features: &mut Vec<String>,
        tokens: &[String],
        index: usize,
        prev_outcomes: &[String],
    ) {
        // Rede de segurança: sentença de comprimento diferente na mesma
        // época indica que o chamador esqueceu de avançá-la
        if self.sentence_len.is_some_and(|len| len != tokens.len()) {
            self.advance_epoch();
        }
        self.sentence_len = Some(tokens.len());

        if let Some(cached) = self.cache.get(&index) {
            self.hits += 1;
            features.extend_from_slice(cached);
            return;
        }

        self.misses += 1;
        let mut produced = Vec::new();
        self.inner.produce(&mut produced, tokens, index, prev_outcomes);
        features.extend_from_slice(&produced);

        if self.cache.len() >= self.capacity {
            // Limpeza total: mais simples e suficiente para o tamanho típico
            self.cache.clear();
        }
        self.cache.insert(index, produced);
    }

    fn update_adaptive(&mut self, tokens: &[String], outcomes: &[String]) {
        self.inner.update_adaptive(tokens, outcomes);
        // O estado adaptativo mudou: features memoizadas ficaram obsoletas
        self.advance_epoch();
    }

    fn clear_adaptive(&mut self) {
        self.inner.clear_adaptive();
        self.advance_epoch();
    }
}
