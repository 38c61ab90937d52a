//! Financial-headline lexicon model.
//!
//! Chinese runs are matched greedily against the lexicon (longest entry
//! first); ASCII runs are matched as whole lowercase words. A negation flips
//! the sign of the next sentiment term, an intensifier scales it, and clause
//! punctuation clears both. Ordinary words that merely start with a negation
//! character (无锡, 未来) are neutral entries, so the longest match consumes
//! them whole. The weighted sum `s` maps to `[0, 1]` through
//! `1 / (1 + e^(-gain * s))`, so a headline with no matches scores exactly 0.5.

use std::collections::HashMap;

use crate::ports::sentiment_port::SentimentModel;

pub const DEFAULT_GAIN: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Entry {
    Term(f64),
    Negation,
    Intensifier(f64),
    Neutral,
}

const POSITIVE_TERMS: &[(&str, f64)] = &[
    ("增长", 0.6),
    ("预增", 0.8),
    ("大增", 0.9),
    ("扭亏", 0.8),
    ("盈利", 0.6),
    ("上涨", 0.6),
    ("大涨", 0.8),
    ("涨停", 0.9),
    ("突破", 0.5),
    ("新高", 0.7),
    ("创新高", 0.8),
    ("回购", 0.6),
    ("增持", 0.7),
    ("中标", 0.6),
    ("签约", 0.5),
    ("获批", 0.7),
    ("利好", 0.8),
    ("分红", 0.5),
    ("超预期", 0.8),
    ("强劲", 0.6),
    ("提升", 0.5),
    ("改善", 0.5),
    ("上调", 0.6),
    ("看好", 0.6),
    ("买入", 0.5),
    ("稳健", 0.4),
    ("bullish", 0.8),
    ("surge", 0.7),
    ("rally", 0.7),
    ("gain", 0.5),
    ("profit", 0.6),
    ("growth", 0.6),
    ("beat", 0.6),
    ("upgrade", 0.6),
    ("record", 0.6),
    ("rebound", 0.5),
];

const NEGATIVE_TERMS: &[(&str, f64)] = &[
    ("下跌", -0.6),
    ("大跌", -0.8),
    ("暴跌", -0.9),
    ("跌停", -0.9),
    ("亏损", -0.8),
    ("预减", -0.8),
    ("下滑", -0.6),
    ("下降", -0.5),
    ("减持", -0.7),
    ("问询函", -0.6),
    ("诉讼", -0.6),
    ("下修", -0.6),
    ("下调", -0.6),
    ("退市", -1.0),
    ("处罚", -0.8),
    ("立案", -0.8),
    ("调查", -0.5),
    ("违规", -0.8),
    ("违约", -0.9),
    ("冻结", -0.6),
    ("警示", -0.6),
    ("风险", -0.4),
    ("利空", -0.8),
    ("承压", -0.5),
    ("担忧", -0.5),
    ("失败", -0.7),
    ("终止", -0.5),
    ("卖出", -0.5),
    ("bearish", -0.8),
    ("crash", -0.9),
    ("plunge", -0.8),
    ("decline", -0.6),
    ("loss", -0.6),
    ("miss", -0.6),
    ("downgrade", -0.6),
    ("fraud", -0.9),
    ("lawsuit", -0.6),
];

const NEGATIONS: &[&str] = &[
    "不", "未", "没有", "无", "并非", "尚未", "not", "no", "never", "don't", "didn't", "isn't",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("大幅", 1.5),
    ("显著", 1.5),
    ("明显", 1.3),
    ("巨额", 1.5),
    ("持续", 1.2),
    ("不断", 1.2),
    ("小幅", 0.6),
    ("略", 0.5),
    ("very", 1.5),
    ("significantly", 1.5),
    ("sharply", 1.5),
    ("slightly", 0.5),
];

const NEUTRAL_COMPOUNDS: &[&str] = &[
    "无锡", "无论", "无人机", "无人驾驶", "无线", "无疑", "无形", "无缝", "未来", "未必", "不仅",
    "不少", "不过", "不同", "不久",
];

fn is_clause_break(c: char) -> bool {
    matches!(c, '，' | '。' | '；' | '！' | '？' | '、' | ',' | '.' | ';' | '!' | '?' | '|')
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '\''
}

pub struct LexiconModel {
    entries: HashMap<String, Entry>,
    max_chars: usize,
    gain: f64,
}

impl Default for LexiconModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconModel {
    pub fn new() -> Self {
        let mut model = Self {
            entries: HashMap::new(),
            max_chars: 0,
            gain: DEFAULT_GAIN,
        };
        for &(word, weight) in POSITIVE_TERMS.iter().chain(NEGATIVE_TERMS) {
            model.insert(word, Entry::Term(weight));
        }
        for &word in NEGATIONS {
            model.insert(word, Entry::Negation);
        }
        for &(word, mult) in INTENSIFIERS {
            model.insert(word, Entry::Intensifier(mult));
        }
        for &word in NEUTRAL_COMPOUNDS {
            model.insert(word, Entry::Neutral);
        }
        model
    }

    fn insert(&mut self, word: &str, entry: Entry) {
        let key = word.to_lowercase();
        self.max_chars = self.max_chars.max(key.chars().count());
        self.entries.insert(key, entry);
    }

    /// Add or override a sentiment term.
    pub fn with_term(mut self, word: &str, weight: f64) -> Self {
        self.insert(word, Entry::Term(weight));
        self
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    fn lookup(&self, chars: &[char], start: usize) -> Option<(Entry, usize)> {
        let longest = self.max_chars.min(chars.len() - start);
        (1..=longest).rev().find_map(|len| {
            let candidate: String = chars[start..start + len].iter().collect();
            self.entries.get(&candidate).map(|e| (*e, len))
        })
    }

    fn entries_in(&self, text: &str) -> Vec<Option<Entry>> {
        let chars: Vec<char> = text.chars().collect();
        let mut out = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if is_word_char(c) {
                let end = chars[i..]
                    .iter()
                    .position(|&c| !is_word_char(c))
                    .map_or(chars.len(), |p| i + p);
                let word: String = chars[i..end].iter().collect::<String>().to_lowercase();
                if let Some(entry) = self.entries.get(&word) {
                    out.push(Some(*entry));
                }
                i = end;
            } else if is_clause_break(c) {
                out.push(None);
                i += 1;
            } else if c.is_whitespace() {
                i += 1;
            } else if let Some((entry, len)) = self.lookup(&chars, i) {
                out.push(Some(entry));
                i += len;
            } else {
                i += 1;
            }
        }
        out
    }

    /// Weighted sum of matched terms, or `None` when nothing matched.
    pub fn raw_score(&self, text: &str) -> Option<f64> {
        let mut total = 0.0;
        let mut matched = false;
        let mut negate = false;
        let mut intensity = 1.0;

        for entry in self.entries_in(text) {
            match entry {
                None => {
                    negate = false;
                    intensity = 1.0;
                }
                Some(Entry::Negation) => negate = !negate,
                Some(Entry::Intensifier(mult)) => intensity *= mult,
                Some(Entry::Neutral) => {}
                Some(Entry::Term(weight)) => {
                    let signed = if negate { -weight } else { weight };
                    total += signed * intensity;
                    matched = true;
                    negate = false;
                    intensity = 1.0;
                }
            }
        }
        matched.then_some(total)
    }
}

impl SentimentModel for LexiconModel {
    fn polarity(&self, text: &str) -> f64 {
        match self.raw_score(text) {
            Some(s) => 1.0 / (1.0 + (-self.gain * s).exp()),
            None => 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn model() -> LexiconModel {
        LexiconModel::new()
    }

    #[test]
    fn no_match_is_exactly_neutral() {
        assert_eq!(model().polarity("药明康德召开年度股东大会"), 0.5);
        assert_eq!(model().polarity(""), 0.5);
        assert_eq!(model().raw_score("hello world"), None);
    }

    #[test]
    fn positive_headline_clears_threshold() {
        let p = model().polarity("药明康德一季度净利润大幅增长");
        assert!(p > 0.7, "p={p}");
    }

    #[test]
    fn negative_headline_clears_threshold() {
        let p = model().polarity("股东拟减持公司股份");
        assert!(p < 0.3, "p={p}");
    }

    #[test]
    fn longest_entry_wins() {
        // 创新高 (0.8), not 新高 (0.7)
        assert_abs_diff_eq!(model().raw_score("股价创新高").unwrap(), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn negation_flips_next_term() {
        assert_abs_diff_eq!(model().raw_score("控股股东不减持").unwrap(), 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(model().raw_score("not bullish").unwrap(), -0.8, epsilon = 1e-12);
    }

    #[test]
    fn intensifier_scales_next_term() {
        assert_abs_diff_eq!(model().raw_score("营收大幅下滑").unwrap(), -0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(model().raw_score("shares very bullish").unwrap(), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn place_name_does_not_negate() {
        assert_abs_diff_eq!(model().raw_score("无锡药明康德股价大涨").unwrap(), 0.8, epsilon = 1e-12);
        assert!(model().polarity("无锡药明康德股价大涨") > 0.7);
    }

    #[test]
    fn future_does_not_negate() {
        assert_abs_diff_eq!(model().raw_score("公司未来业绩增长可期").unwrap(), 0.6, epsilon = 1e-12);
        assert!(model().polarity("公司未来业绩增长可期") > 0.7);
    }

    #[test]
    fn neutral_compounds_leave_terms_unflipped() {
        for headline in [
            "无论市场如何公司持续回购",
            "无人机订单增长",
            "无线业务收入增长",
            "不仅营收增长",
            "不少机构看好",
        ] {
            let raw = model().raw_score(headline).unwrap();
            assert!(raw > 0.0, "{headline}: raw={raw}");
        }
    }

    #[test]
    fn bare_negation_characters_still_flip() {
        assert_abs_diff_eq!(model().raw_score("业绩未增长").unwrap(), -0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(model().raw_score("无增长").unwrap(), -0.6, epsilon = 1e-12);
        assert_eq!(model().raw_score("未来"), None);
    }

    #[test]
    fn clause_break_resets_modifiers() {
        // The negation before the comma does not reach 回购.
        assert_abs_diff_eq!(model().raw_score("未披露，回购").unwrap(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn mixed_terms_sum() {
        assert_abs_diff_eq!(model().raw_score("扭亏 但 风险").unwrap(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn english_words_are_case_insensitive() {
        assert_abs_diff_eq!(model().raw_score("Earnings BEAT estimates").unwrap(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn custom_terms_and_gain() {
        let m = model().with_term("出海", 0.5).with_gain(1.0);
        let expected = 1.0 / (1.0 + (-0.5f64).exp());
        assert_abs_diff_eq!(m.polarity("加速出海"), expected, epsilon = 1e-12);
    }

    #[test]
    fn polarity_stays_in_unit_interval() {
        let p = model().polarity("退市 退市 退市 退市 退市 退市 退市 退市 退市 退市 退市 退市 退市 退市 退市 退市 退市 退市 退市 退市");
        assert!((0.0..=1.0).contains(&p));
    }
}
