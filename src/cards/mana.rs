//! Symbolic mana costs and converted cost.
//!
//! A cost string is a sequence of braced symbols, e.g. `{2}{B}{R}`.
//! Split cards separate their faces with `//`; every face's symbols count.
//!
//! ## Converted cost
//!
//! - Numeric symbol: its value (`{2}` → 2)
//! - Variable symbol `X`, `Y`, `Z`: 0
//! - Any other symbol (colored, colorless, hybrid, phyrexian, snow): 1
//!
//! A malformed string has converted cost 0 via [`converted_cost`].

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// One braced symbol in a mana cost.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManaSymbol {
    /// Numeric generic cost (`{3}`).
    Generic(u32),
    /// Variable cost chosen on cast (`{X}`, `{Y}`, `{Z}`).
    Variable(char),
    /// Any other symbol, stored as written (`{B}`, `{W/U}`, `{C}`).
    Symbol(String),
}

impl ManaSymbol {
    /// Contribution of this symbol to converted cost.
    #[must_use]
    pub fn converted(&self) -> u32 {
        match self {
            ManaSymbol::Generic(n) => *n,
            ManaSymbol::Variable(_) => 0,
            ManaSymbol::Symbol(_) => 1,
        }
    }

    fn from_token(token: &str) -> Result<Self, ManaCostError> {
        if token.bytes().all(|b| b.is_ascii_digit()) {
            return token
                .parse::<u32>()
                .map(ManaSymbol::Generic)
                .map_err(|_| ManaCostError::NumberTooLarge(token.to_string()));
        }
        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            let upper = c.to_ascii_uppercase();
            if matches!(upper, 'X' | 'Y' | 'Z') {
                return Ok(ManaSymbol::Variable(upper));
            }
        }
        Ok(ManaSymbol::Symbol(token.to_string()))
    }
}

impl std::fmt::Display for ManaSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManaSymbol::Generic(n) => write!(f, "{{{}}}", n),
            ManaSymbol::Variable(c) => write!(f, "{{{}}}", c),
            ManaSymbol::Symbol(s) => write!(f, "{{{}}}", s),
        }
    }
}

/// Reasons a mana cost string fails to parse.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ManaCostError {
    /// `{` without a matching `}`.
    #[error("unclosed brace at byte {0}")]
    UnclosedBrace(usize),
    /// `{}` with nothing inside.
    #[error("empty symbol at byte {0}")]
    EmptySymbol(usize),
    /// Text outside any brace pair.
    #[error("unexpected {ch:?} at byte {at}")]
    UnexpectedChar {
        /// Offending character.
        ch: char,
        /// Byte offset in the input.
        at: usize,
    },
    /// Numeric symbol that does not fit in `u32`.
    #[error("numeric symbol {0} is too large")]
    NumberTooLarge(String),
}

/// Parsed mana cost.
///
/// ```
/// use rust_ccg_sync::cards::ManaCost;
///
/// let cost = ManaCost::parse("{2}{B}{R}").unwrap();
/// assert_eq!(cost.converted(), 4);
/// assert_eq!(cost.symbols().len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManaCost {
    symbols: SmallVec<[ManaSymbol; 6]>,
}

impl ManaCost {
    /// Parse a symbolic cost string. An empty or blank string is a free cost.
    ///
    /// # Errors
    ///
    /// Returns a [`ManaCostError`] describing the first malformed position.
    pub fn parse(text: &str) -> Result<Self, ManaCostError> {
        let mut symbols = SmallVec::new();
        let mut rest = text.char_indices().peekable();

        while let Some((at, ch)) = rest.next() {
            match ch {
                '{' => {
                    let start = at + 1;
                    let end = text[start..]
                        .find('}')
                        .map(|offset| start + offset)
                        .ok_or(ManaCostError::UnclosedBrace(at))?;
                    let token = text[start..end].trim();
                    if token.is_empty() {
                        return Err(ManaCostError::EmptySymbol(at));
                    }
                    if token.contains('{') {
                        return Err(ManaCostError::UnclosedBrace(at));
                    }
                    symbols.push(ManaSymbol::from_token(token)?);
                    while rest.peek().is_some_and(|&(i, _)| i <= end) {
                        rest.next();
                    }
                }
                // Face separator on split cards.
                '/' if rest.peek().is_some_and(|&(_, c)| c == '/') => {
                    rest.next();
                }
                c if c.is_whitespace() => {}
                c => return Err(ManaCostError::UnexpectedChar { ch: c, at }),
            }
        }

        Ok(Self { symbols })
    }

    /// Symbols in written order.
    #[must_use]
    pub fn symbols(&self) -> &[ManaSymbol] {
        &self.symbols
    }

    /// Converted cost: numeric values plus one per non-variable symbol.
    #[must_use]
    pub fn converted(&self) -> u32 {
        self.symbols
            .iter()
            .fold(0u32, |total, s| total.saturating_add(s.converted()))
    }

    /// True if the cost has no symbols.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl std::fmt::Display for ManaCost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

/// Converted cost of a cost string; malformed strings count as 0.
///
/// ```
/// use rust_ccg_sync::cards::converted_cost;
///
/// assert_eq!(converted_cost("{2}{B}{R}"), 4);
/// assert_eq!(converted_cost("{X}{U}"), 1);
/// assert_eq!(converted_cost(""), 0);
/// assert_eq!(converted_cost("{2}{B"), 0);
/// ```
#[must_use]
pub fn converted_cost(text: &str) -> u32 {
    ManaCost::parse(text).map(|c| c.converted()).unwrap_or(0)
}
