use std::{fmt::Display, str::FromStr};

use derives::Names;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::lenient,
};

/// One of the user's two shelves as stored by the backend.
#[derive(Names, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    #[serde(rename = "_id")]
    pub id:       String,
    #[serde(default, deserialize_with = "lenient::bool_or_string")]
    pub wishlist: bool,
    #[serde(default, deserialize_with = "lenient::string_or_null")]
    pub user:     String,
}

impl Library {
    pub fn shelf(&self) -> Shelf {
        Shelf::from_wishlist(self.wishlist)
    }
}

/// Books owned versus books wanted. Every user has exactly one library of each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shelf {
    #[default]
    Owned,
    Wishlist,
}

impl Shelf {
    pub fn from_wishlist(wishlist: bool) -> Self {
        if wishlist {
            Shelf::Wishlist
        } else {
            Shelf::Owned
        }
    }

    pub fn is_wishlist(&self) -> bool {
        matches!(self, Shelf::Wishlist)
    }
}

impl FromStr for Shelf {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "owned" | "library" | "false" => Ok(Shelf::Owned),
            "wishlist" | "wanted" | "true" => Ok(Shelf::Wishlist),
            _ => Err(Error::validation(
                "shelf",
                "Shelf has to be either owned or wishlist",
            )),
        }
    }
}

impl Display for Shelf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shelf::Owned => write!(f, "owned"),
            Shelf::Wishlist => write!(f, "wishlist"),
        }
    }
}
