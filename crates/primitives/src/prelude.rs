pub use crate::{
    address::Address,
    amount::Amount,
    big::Big,
    buf::{Buf32, Buf64},
    currency::CurrencyId,
    keys::{AccountKey, AccountKeys},
    params::{ExecParams, Height, NetworkId},
    sig::PublicKey,
};
