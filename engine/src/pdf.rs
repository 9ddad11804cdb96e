//! Page references such as `B102`, `MA:23` or `B340`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::leading_int;
use crate::error::{OtfError, Result};

/// How the Basic Set is installed: one combined volume or Characters and
/// Campaigns as separate books.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasicSetPdf {
    #[default]
    Combined,
    Separate,
}

/// Last page of Basic Set: Characters.
const CHARACTERS_LAST_PAGE: i32 = 336;

const FALLBACK_URL: &str = "http://www.warehouse23.com/products?taxons%5B%5D=558398545-sb";

const PRODUCTS: &[(&str, &str)] = &[
    ("ACT1", "http://www.warehouse23.com/products/gurps-action-1-heroes"),
    ("ACT3", "http://www.warehouse23.com/products/gurps-action-3-furious-fists"),
    ("B", "http://www.warehouse23.com/products/gurps-basic-set-characters-and-campaigns"),
    ("BS", "http://www.warehouse23.com/products/gurps-banestorm"),
    ("DF1", "http://www.warehouse23.com/products/gurps-dungeon-fantasy-1-adventurers-1"),
    ("DF3", "http://www.warehouse23.com/products/gurps-dungeon-fantasy-3-the-next-level-1"),
    ("DF4", "http://www.warehouse23.com/products/gurps-dungeon-fantasy-4-sages-1"),
    ("DF8", "http://www.warehouse23.com/products/gurps-dungeon-fantasy-8-treasure-tables"),
    ("DF11", "http://www.warehouse23.com/products/gurps-dungeon-fantasy-11-power-ups"),
    ("DFA", "http://www.warehouse23.com/products/dungeon-fantasy-roleplaying-game"),
    ("DFM", "http://www.warehouse23.com/products/dungeon-fantasy-roleplaying-game"),
    ("DR", "http://www.warehouse23.com/products/gurps-dragons-1"),
    ("F", "http://www.warehouse23.com/products/gurps-fantasy"),
    ("H", "http://www.warehouse23.com/products/gurps-horror-1"),
    ("HT", "http://www.warehouse23.com/products/gurps-high-tech-2"),
    ("LT", "http://www.warehouse23.com/products/gurps-fourth-edition-low-tech"),
    ("M", "http://www.warehouse23.com/products/gurps-magic-5"),
    ("MA", "http://www.warehouse23.com/products/gurps-martial-arts"),
    ("MATG", "http://www.warehouse23.com/products/gurps-martial-arts-technical-grappling"),
    ("P", "http://www.warehouse23.com/products/gurps-powers"),
    ("PSI", "http://www.warehouse23.com/products/gurps-psionic-powers"),
    ("PU1", "http://www.warehouse23.com/products/gurps-power-ups-1-imbuements-1"),
    ("PU2", "http://www.warehouse23.com/products/gurps-power-ups-2-perks"),
    ("PU3", "http://www.warehouse23.com/products/gurps-power-ups-3-talents"),
    ("SU", "http://www.warehouse23.com/products/gurps-supers-3"),
    ("TMS", "http://www.warehouse23.com/products/gurps-thaumatology-magical-styles"),
    ("TRPM", "http://www.warehouse23.com/products/gurps-thaumatology-ritual-path-magic"),
];

/// Store page for a book code, if known.
pub fn product_url(book: &str) -> Option<&'static str> {
    PRODUCTS.iter().find(|(code, _)| *code == book).map(|(_, url)| *url)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfReference {
    pub book: String,
    pub page: Option<i32>,
    /// Product page to fall back on when no local PDF is registered.
    pub url: String,
}

impl PdfReference {
    pub fn resolve(link: &str, basic_set: BasicSetPdf) -> Result<Self> {
        let t = link.trim();
        let (mut book, mut page) = match t.find(':') {
            Some(i) if i > 0 => (t[..i].trim().to_string(), leading_int(&t[i + 1..])),
            _ => {
                let letters: String = t.chars().filter(|c| !c.is_ascii_digit()).collect();
                let digits: String = t.chars().filter(|c| !c.is_ascii_alphabetic()).collect();
                (letters.trim().to_string(), leading_int(&digits))
            }
        };
        if book.is_empty() {
            return Err(OtfError::InvalidReference(link.to_string()));
        }
        if book == "B" {
            if let Some(p) = page.filter(|&p| p > CHARACTERS_LAST_PAGE) {
                match basic_set {
                    BasicSetPdf::Separate => {
                        book = "BX".into();
                        page = Some(p - (CHARACTERS_LAST_PAGE - 1));
                    }
                    BasicSetPdf::Combined => page = Some(p + 2),
                }
            }
        }
        let url = product_url(&book).unwrap_or(FALLBACK_URL).to_string();
        debug!(book = %book, ?page, "pdf reference");
        Ok(Self { book, page, url })
    }
}

impl std::fmt::Display for PdfReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.page {
            Some(page) => write!(f, "{} p.{page}", self.book),
            None => f.write_str(&self.book),
        }
    }
}
