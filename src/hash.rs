/*
    Hash module include hash functions necessary to hash keys,
    scripts and transactions.
*/

use crate::{
    Ripemd160, Sha256, Sha512, Digest,
    Hmac, Mac, NewMac
};

/*
    Takes in a byte array and returns the sha256 hash of it
*/
pub fn sha256<T>(input: T) -> [u8; 32]
where T: AsRef<[u8]>
{
    let mut r = Sha256::new();
    r.update(input);
    let mut out = [0u8; 32];
    out.copy_from_slice(&r.finalize());
    out
}

/*
    Sha256 applied twice. Used for transaction ids and signature hashes.
*/
pub fn double_sha256<T>(input: T) -> [u8; 32]
where T: AsRef<[u8]>
{
    sha256(sha256(input))
}

/*
    Takes in an byte array and returns the ripemd160 hash of it
*/
pub fn ripemd160<T>(input: T) -> [u8; 20]
where T: AsRef<[u8]>
{
    let mut r = Ripemd160::new();
    r.update(input);
    let mut out = [0u8; 20];
    out.copy_from_slice(&r.finalize());
    out
}

/*
    Ripemd160( Sha256( input ) )
*/
pub fn hash160<T>(input: T) -> [u8; 20]
where T: AsRef<[u8]>
{
    ripemd160(sha256(input))
}

/*
    HMAC-SHA512 of data under key. None only if the mac rejects the key.
*/
pub fn hmac_sha512(data: &[u8], key: &[u8]) -> Option<[u8; 64]> {
    let mut mac = Hmac::<Sha512>::new_from_slice(key).ok()?;
    mac.update(data);
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Some(out)
}
