//! # Domain Models
//!
//! Card and price types shared by every layer of tcgscout.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Game`] | Card game of a recognized card |
//! | [`Confidence`] | How sure the recognizer (or user) is |
//! | [`CardIdentity`] | Structured guess about a physical card |
//! | [`RelatedCard`] | Card suggested alongside an identification |
//! | [`PriceResult`] | Common output shape of every price source |
//! | [`PricePoint`] | Market/low/mid/high prices for one variant |
//! | [`SearchLink`] | Named search URL used by the fallback result |
//!
//! ## Tolerance
//!
//! [`CardIdentity`] comes from a language model and is never trusted: every
//! field except `game` is optional, unknown enum values degrade (an unknown
//! game becomes [`Game::Other`], an unknown confidence becomes `None`) and a
//! mistyped field never fails deserialization of the whole record.
//!
//! ```rust
//! use tcgscout_core::{CardIdentity, Game};
//!
//! let card: CardIdentity =
//!     serde_json::from_str(r#"{"game": "Digimon", "card_number": 12}"#).unwrap();
//! assert_eq!(card.game, Game::Other);
//! assert_eq!(card.card_number.as_deref(), Some("12"));
//! ```

mod card;
mod game;
mod price;

pub use card::{CardIdentity, RelatedCard};
pub use game::{Confidence, Game};
pub use price::{PricePoint, PriceResult, PriceTable, SearchLink, DEFAULT_VARIANT};
