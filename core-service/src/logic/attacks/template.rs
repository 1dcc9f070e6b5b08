//! Data Templates - known string structures assumed by the attacker
//!
//! Each template is pure configuration: how to generate syntactically valid
//! instances, how to recognise one, and which character ranges the
//! reconstruction search optimizes segment by segment.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use crate::logic::error::{Result, VectorScopeError};

// ============================================================================
// BUILT-IN FORMATS
// ============================================================================

static SSN_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SSN: \d{3}-\d{2}-\d{4}$").expect("valid SSN regex"));

static CARD_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Credit Card: (?:\d{4}-\d{4}-\d{4}-\d{4}|\d{4}-\d{6}-\d{5})$").expect("valid card regex")
});

// ============================================================================
// TYPES
// ============================================================================

/// Payment card issuer: leading digits + total number length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardIssuer {
    pub prefix: String,
    pub length: usize,
}

impl CardIssuer {
    pub fn new(prefix: &str, length: usize) -> Self {
        Self {
            prefix: prefix.to_string(),
            length,
        }
    }
}

/// One piece of a generated instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Fixed text
    Literal(String),
    /// Uniform integer in `[min, max)`, zero-padded to `width`
    Number { min: u32, max: u32, width: usize },
    /// Card number from a random issuer, hyphen grouped
    CardNumber { issuers: Vec<CardIssuer> },
}

impl Piece {
    fn generate<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut String) {
        match self {
            Piece::Literal(text) => out.push_str(text),
            Piece::Number { min, max, width } => {
                let value = if max > min { rng.gen_range(*min..*max) } else { *min };
                out.push_str(&format!("{:0width$}", value, width = *width));
            }
            Piece::CardNumber { issuers } => {
                if issuers.is_empty() {
                    return;
                }
                let issuer = &issuers[rng.gen_range(0..issuers.len())];
                let mut number = issuer.prefix.clone();
                while number.len() < issuer.length {
                    number.push(random_digit(rng));
                }
                out.push_str(&group_card_digits(&number));
            }
        }
    }
}

/// Reconstruction segment: digits in `[start, end)` (char indices)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    /// Local mutations generated per beam member
    pub mutations: usize,
}

impl Segment {
    pub const fn new(start: usize, end: usize, mutations: usize) -> Self {
        Self { start, end, mutations }
    }

    /// Randomize the digits inside this segment, leave everything else intact
    pub fn mutate<R: Rng + ?Sized>(&self, base: &str, rng: &mut R) -> String {
        base.chars()
            .enumerate()
            .map(|(i, c)| {
                if i >= self.start && i < self.end && c.is_ascii_digit() {
                    random_digit(rng)
                } else {
                    c
                }
            })
            .collect()
    }
}

// ============================================================================
// DATA TEMPLATE
// ============================================================================

/// Declarative description of one data type
#[derive(Debug, Clone)]
pub struct DataTemplate {
    /// Tag used to select the template ("ssn", "creditcard")
    pub name: String,
    /// Human readable category
    pub label: String,
    /// All-zero instance, start of the reconstruction beam
    pub zero_template: String,
    /// Optimization order of the reconstruction search
    pub segments: Vec<Segment>,
    pieces: Vec<Piece>,
    format: Regex,
}

impl DataTemplate {
    /// Custom template; segments must lie inside the zero template
    pub fn new(
        name: &str,
        label: &str,
        zero_template: &str,
        pieces: Vec<Piece>,
        format: Regex,
        segments: Vec<Segment>,
    ) -> Result<Self> {
        let len = zero_template.chars().count();
        if let Some(bad) = segments.iter().find(|s| s.start >= s.end || s.end > len) {
            return Err(VectorScopeError::InvalidInput(format!(
                "segment {}..{} outside template '{}' (length {})",
                bad.start, bad.end, zero_template, len
            )));
        }
        if !format.is_match(zero_template) {
            return Err(VectorScopeError::InvalidInput(format!(
                "zero template '{}' does not match its own format",
                zero_template
            )));
        }

        Ok(Self {
            name: canonical_name(name),
            label: label.to_string(),
            zero_template: zero_template.to_string(),
            segments,
            pieces,
            format,
        })
    }

    /// `SSN: AAA-GG-SSSS`, optimized area, group, then serial
    pub fn ssn() -> Self {
        Self {
            name: "ssn".to_string(),
            label: "Social Security Number".to_string(),
            zero_template: "SSN: 000-00-0000".to_string(),
            segments: vec![Segment::new(5, 8, 100), Segment::new(9, 11, 50), Segment::new(12, 16, 50)],
            pieces: vec![
                Piece::Literal("SSN: ".to_string()),
                Piece::Number { min: 1, max: 900, width: 3 },
                Piece::Literal("-".to_string()),
                Piece::Number { min: 1, max: 100, width: 2 },
                Piece::Literal("-".to_string()),
                Piece::Number { min: 1, max: 10000, width: 4 },
            ],
            format: SSN_FORMAT.clone(),
        }
    }

    /// `Credit Card: DDDD-DDDD-DDDD-DDDD` (Amex: `DDDD-DDDDDD-DDDDD`)
    pub fn credit_card() -> Self {
        let issuers = vec![
            CardIssuer::new("4", 16),    // Visa
            CardIssuer::new("51", 16),   // Mastercard
            CardIssuer::new("52", 16),
            CardIssuer::new("53", 16),
            CardIssuer::new("54", 16),
            CardIssuer::new("55", 16),
            CardIssuer::new("34", 15),   // American Express
            CardIssuer::new("37", 15),
            CardIssuer::new("6011", 16), // Discover
        ];

        Self {
            name: "creditcard".to_string(),
            label: "Credit Card Number".to_string(),
            zero_template: "Credit Card: 0000-0000-0000-0000".to_string(),
            segments: vec![
                Segment::new(13, 17, 50),
                Segment::new(18, 22, 50),
                Segment::new(23, 27, 50),
                Segment::new(28, 32, 50),
            ],
            pieces: vec![
                Piece::Literal("Credit Card: ".to_string()),
                Piece::CardNumber { issuers },
            ],
            format: CARD_FORMAT.clone(),
        }
    }

    /// One syntactically valid instance
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut out = String::with_capacity(self.zero_template.len());
        for piece in &self.pieces {
            piece.generate(rng, &mut out);
        }
        out
    }

    /// Does `text` follow this template's format?
    pub fn matches(&self, text: &str) -> bool {
        self.format.is_match(text)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Ordered set of templates the attacks support
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<DataTemplate>,
}

impl TemplateRegistry {
    pub fn builtin() -> Self {
        Self {
            templates: vec![DataTemplate::ssn(), DataTemplate::credit_card()],
        }
    }

    /// Add or replace a template
    pub fn register(&mut self, mut template: DataTemplate) {
        template.name = canonical_name(&template.name);
        match self.templates.iter_mut().find(|t| t.name == template.name) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    /// Lookup by tag ("credit_card", "credit-card" and "cc" resolve to "creditcard")
    pub fn get(&self, data_type: &str) -> Result<&DataTemplate> {
        let key = canonical_name(data_type);
        self.templates
            .iter()
            .find(|t| t.name == key)
            .ok_or_else(|| VectorScopeError::UnsupportedDataType(data_type.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn canonical_name(data_type: &str) -> String {
    let key: String = data_type
        .to_lowercase()
        .chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .collect();
    match key.as_str() {
        "cc" => "creditcard".to_string(),
        _ => key,
    }
}

fn random_digit<R: Rng + ?Sized>(rng: &mut R) -> char {
    char::from(b'0' + rng.gen_range(0..10u8))
}

/// 15 digits: 4-6-5, otherwise groups of 4
fn group_card_digits(number: &str) -> String {
    let groups: Vec<&str> = if number.len() == 15 {
        vec![&number[..4], &number[4..10], &number[10..]]
    } else {
        let mut groups = Vec::new();
        let mut rest = number;
        while rest.len() > 4 {
            let (head, tail) = rest.split_at(4);
            groups.push(head);
            rest = tail;
        }
        groups.push(rest);
        groups
    };
    groups.join("-")
}
