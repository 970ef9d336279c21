use serde::{Deserialize, Serialize};

mod crypto;
mod database;
mod file;
mod point_of_sale;
mod store;

#[derive(Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq, Eq, Debug))]
pub enum Database {
    V1(DatabaseV1),
}

pub use crypto::{decode_key, encode_key, Cipher, DbKey, XChaCha20Poly1305Cipher};
pub use database::{DailySales, DatabaseV1};
pub use file::{load, save};
pub use point_of_sale::{PointOfSale, PointOfSaleId};
pub use store::FileStore;

#[cfg(test)]
pub(crate) use crypto::testutils as crypto_testutils;
