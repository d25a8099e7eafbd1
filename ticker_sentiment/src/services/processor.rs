use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::Result;
use crate::models::SentimentLabel;
use crate::services::decision::ThresholdPolicy;
use crate::services::model::SentimentModel;

// Английские стоп-слова NLTK
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
    "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
    "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
    "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
    "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don",
    "don't", "should", "should've", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren",
    "aren't", "couldn", "couldn't", "didn", "didn't", "doesn", "doesn't", "hadn", "hadn't",
    "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma", "mightn", "mightn't", "mustn",
    "mustn't", "needn", "needn't", "shan", "shan't", "shouldn", "shouldn't", "wasn", "wasn't",
    "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

// Слова на -s, которые уже являются леммой
const UNCHANGED_NOUNS: &[&str] = &[
    "news", "series", "species", "earnings", "savings", "sales", "means", "physics",
    "economics", "politics", "always", "perhaps", "whereas", "across",
];

const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("indices", "index"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
];

/// Очистка текста перед классификацией
pub struct TextNormalizer {
    url_regex: Regex,
    stop_words: HashSet<&'static str>,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(TextNormalizer {
            url_regex: Regex::new(r"http\S+|www\S+")?,
            stop_words: STOP_WORDS.iter().copied().collect(),
        })
    }

    /// Нижний регистр, без ссылок и пунктуации, без стоп-слов, с леммами
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let without_urls = self.url_regex.replace_all(&lowered, "");
        let without_punctuation: String = without_urls
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .collect();

        without_punctuation
            .split_whitespace()
            .filter(|token| !self.stop_words.contains(token))
            .map(lemmatize)
            .collect::<Vec<String>>()
            .join(" ")
    }

    /// Заголовок и описание чистятся по отдельности и склеиваются через ". "
    pub fn combine(&self, title: &str, summary: &str) -> String {
        format!("{}. {}", self.normalize(title), self.normalize(summary))
    }
}

fn lemmatize(token: &str) -> String {
    if let Some((_, lemma)) = IRREGULAR_NOUNS.iter().find(|(plural, _)| *plural == token) {
        return lemma.to_string();
    }

    if token.len() <= 3
        || !token.ends_with('s')
        || UNCHANGED_NOUNS.contains(&token)
        || token.ends_with("ss")
        || token.ends_with("us")
        || token.ends_with("is")
    {
        return token.to_string();
    }

    if token.len() > 4 {
        if let Some(stem) = token.strip_suffix("ies") {
            return format!("{}y", stem);
        }
    }

    for suffix in ["sses", "shes", "ches", "xes", "zzes"] {
        if let Some(stem) = token.strip_suffix(suffix) {
            return format!("{}{}", stem, &suffix[..suffix.len() - 2]);
        }
    }

    token[..token.len() - 1].to_string()
}

/// Классификатор статьи: модель даёт вероятности, порог даёт метку
#[derive(Clone)]
pub struct SentimentClassifier {
    model: Arc<dyn SentimentModel>,
    policy: ThresholdPolicy,
}

impl SentimentClassifier {
    pub fn new(model: Arc<dyn SentimentModel>) -> Self {
        SentimentClassifier {
            model,
            policy: ThresholdPolicy::default(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    pub async fn classify(&self, text: &str) -> Result<(SentimentLabel, f64)> {
        let probabilities = self.model.predict(text).await?;
        let score = probabilities.score();
        Ok((self.policy.label_for(score), score))
    }

    /// Пробный прогон при старте: недоступная модель должна остановить запуск
    pub async fn warm_up(&self) -> Result<()> {
        let (label, score) = self.classify("stock market update").await?;
        tracing::info!(
            "Модель {} готова (пробная оценка: {} {:.3})",
            self.model_name(),
            label,
            score
        );
        Ok(())
    }
}
