use crate::error::TokenizeError;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{M}\p{N}]+").expect("valid regex");
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    static ref FRENCH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "à","ai","aie","au","aux","avec","avons","avez","c","ce","ces","d","dans","de","des","du",
            "elle","elles","en","est","et","été","être","eu","eux","il","ils","j","je","l","la","le","les",
            "leur","leurs","lui","m","ma","mais","me","même","mes","moi","mon","n","ne","nos","notre","nous",
            "on","ont","ou","par","pas","pour","qu","que","qui","s","sa","se","ses","son","sont","sur",
            "t","ta","te","tes","toi","ton","tu","un","une","vos","votre","vous","y"
        ];
        words.iter().copied().collect()
    };
}

/// Language used by the optional stop-word and stemming filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    French,
}

impl Language {
    pub fn stemmer(self) -> Stemmer {
        match self {
            Language::English => Stemmer::create(Algorithm::English),
            Language::French => Stemmer::create(Algorithm::French),
        }
    }

    fn stopwords(self) -> &'static HashSet<&'static str> {
        match self {
            Language::English => &*ENGLISH_STOPWORDS,
            Language::French => &*FRENCH_STOPWORDS,
        }
    }
}

/// Filters applied after splitting. Everything is off by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub stopwords: Option<Language>,
    pub stemmer: Option<Language>,
    /// Upper bound on the number of tokens a single document may produce.
    pub max_tokens: Option<usize>,
}

pub struct Tokenizer {
    stopwords: Option<&'static HashSet<&'static str>>,
    stemmer: Option<Stemmer>,
    max_tokens: Option<usize>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            stopwords: config.stopwords.map(Language::stopwords),
            stemmer: config.stemmer.map(Language::stemmer),
            max_tokens: config.max_tokens,
        }
    }

    /// NFKC-normalize, lowercase and split on anything that is not a letter, mark or digit,
    /// then apply the configured stop-word and stemming filters.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        for mat in RE.find_iter(&normalized) {
            let token = mat.as_str();
            if let Some(stopwords) = self.stopwords {
                if stopwords.contains(token) { continue; }
            }
            match &self.stemmer {
                Some(stemmer) => tokens.push(stemmer.stem(token).into_owned()),
                None => tokens.push(token.to_string()),
            }
        }
        tokens
    }

    /// Like [`Tokenizer::tokenize`], but rejects documents over the configured token limit.
    pub fn tokenize_document(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        let tokens = self.tokenize(text);
        match self.max_tokens {
            Some(limit) if tokens.len() > limit => Err(TokenizeError::TooManyTokens { count: tokens.len(), limit }),
            _ => Ok(tokens),
        }
    }
}

/// Tokenize with the default configuration: no stop-words, no stemming.
pub fn tokenize(text: &str) -> Vec<String> {
    lazy_static! {
        static ref DEFAULT: Tokenizer = Tokenizer::default();
    }
    DEFAULT.tokenize(text)
}
