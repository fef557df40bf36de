//! Wire representation of a client-credentials token response.

// crates.io
use serde::Deserializer;
// self
use crate::{_prelude::*, auth::token::secret::TokenSecret, error::DecodeError};

/// JSON body returned by the token endpoint on success.
///
/// Numeric fields are transmitted as decimal strings by the authorization server; plain JSON
/// numbers are accepted as well.
#[derive(Clone, Deserialize)]
pub struct AccessTokenResponse {
	/// Issued bearer token.
	pub access_token: TokenSecret,
	/// Lifetime in seconds, as reported by the server.
	#[serde(default, deserialize_with = "string_or_number")]
	pub expires_in: Option<String>,
	/// Absolute expiry as Unix epoch seconds.
	#[serde(default, deserialize_with = "string_or_number")]
	pub expires_on: Option<String>,
	/// Start of validity as Unix epoch seconds.
	#[serde(default, deserialize_with = "string_or_number")]
	pub not_before: Option<String>,
	/// Resource the token was issued for.
	#[serde(default)]
	pub resource: Option<String>,
	/// Token type, usually `Bearer`.
	#[serde(default)]
	pub token_type: Option<String>,
}
impl AccessTokenResponse {
	/// Parses `expires_on` into an absolute instant.
	///
	/// The server is expected to always send a well-formed value; a missing or malformed field
	/// is reported as a [`DecodeError`] instead of being treated as "never expires".
	pub fn expires_at(&self) -> Result<OffsetDateTime, DecodeError> {
		let raw = self.expires_on.as_deref().ok_or(DecodeError::MissingExpiresOn)?;

		parse_epoch(raw)
	}

	/// Checks expiry against the current clock, surfacing parse failures.
	pub fn is_expired(&self) -> Result<bool, DecodeError> {
		Ok(self.expires_at()? <= OffsetDateTime::now_utc())
	}

	/// Parses `not_before`; informational only, so malformed values are ignored.
	pub fn not_before(&self) -> Option<OffsetDateTime> {
		self.not_before.as_deref().and_then(|raw| parse_epoch(raw).ok())
	}
}
impl Debug for AccessTokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessTokenResponse")
			.field("access_token", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.field("expires_on", &self.expires_on)
			.field("not_before", &self.not_before)
			.field("resource", &self.resource)
			.field("token_type", &self.token_type)
			.finish()
	}
}

fn parse_epoch(raw: &str) -> Result<OffsetDateTime, DecodeError> {
	let secs = raw
		.parse::<i64>()
		.map_err(|source| DecodeError::InvalidExpiresOn { value: raw.to_owned(), source })?;

	OffsetDateTime::from_unix_timestamp(secs)
		.map_err(|_| DecodeError::ExpiresOnOutOfRange { value: raw.to_owned() })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Text(String),
		Number(i64),
	}

	Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
		Raw::Text(text) => text,
		Raw::Number(number) => number.to_string(),
	}))
}
