use anyhow::{Error, bail};
use reqwest::get;

use crate::{Bank, decode_bank};

pub async fn get_remote_bank(url: &str) -> Result<Bank, Error> {
    let response = get(url).await?;

    if !response.status().is_success() {
        bail!("Fetching bank from {url} failed with {}", response.status());
    }

    let bytes = response.bytes().await?;

    decode_bank(&bytes)
}
