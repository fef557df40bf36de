//! Immutable access token snapshot and lifecycle helpers.

// self
use crate::{
	_prelude::*,
	auth::token::{response::AccessTokenResponse, secret::TokenSecret},
	error::DecodeError,
};

/// Current lifecycle status for a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
	/// Token is not usable yet because its `not_before` instant is in the future.
	Pending,
	/// Token is currently valid.
	Active,
	/// Token reached its expiry instant.
	Expired,
}

/// Result of one token acquisition.
///
/// Built once from a token endpoint response and never mutated afterwards; a newer acquisition
/// produces a new value that supersedes this one.
#[derive(Clone)]
pub struct Token {
	value: TokenSecret,
	expires_at: OffsetDateTime,
	not_before: Option<OffsetDateTime>,
	token_type: Option<String>,
	resource: Option<String>,
}
impl Token {
	/// Creates a token from a raw value and an absolute expiry.
	pub fn new(value: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self {
			value: TokenSecret::new(value),
			expires_at,
			not_before: None,
			token_type: None,
			resource: None,
		}
	}

	/// Returns the raw access token value. Callers must avoid logging it.
	pub fn value(&self) -> &str {
		self.value.expose()
	}

	/// Returns the redacting secret wrapper.
	pub fn secret(&self) -> &TokenSecret {
		&self.value
	}

	/// Expiry instant reported by the server.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Instant before which the token must not be used, if the server reported one.
	pub fn not_before(&self) -> Option<OffsetDateTime> {
		self.not_before
	}

	/// Token type reported by the server (usually `Bearer`).
	pub fn token_type(&self) -> Option<&str> {
		self.token_type.as_deref()
	}

	/// Resource the token was issued for.
	pub fn resource(&self) -> Option<&str> {
		self.resource.as_deref()
	}

	/// Computes the lifecycle status at a given instant.
	///
	/// Expiry is inclusive: a token whose expiry equals `instant` is already expired.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}
		if self.not_before.is_some_and(|nbf| instant < nbf) {
			return TokenStatus::Pending;
		}

		TokenStatus::Active
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> TokenStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Remaining lifetime at `instant`; zero once expired.
	pub fn expires_in_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_positive() { remaining } else { Duration::ZERO }
	}
}
impl TryFrom<AccessTokenResponse> for Token {
	type Error = DecodeError;

	fn try_from(response: AccessTokenResponse) -> Result<Self, Self::Error> {
		let expires_at = response.expires_at()?;
		let not_before = response.not_before();

		Ok(Self {
			value: response.access_token,
			expires_at,
			not_before,
			token_type: response.token_type,
			resource: response.resource,
		})
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("value", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.field("not_before", &self.not_before)
			.field("token_type", &self.token_type)
			.field("resource", &self.resource)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn expiry_boundary_is_inclusive() {
		let expires = macros::datetime!(2025-01-01 01:00 UTC);
		let token = Token::new("abc", expires);

		assert_eq!(token.status_at(macros::datetime!(2025-01-01 00:59 UTC)), TokenStatus::Active);
		assert_eq!(token.status_at(expires), TokenStatus::Expired);
		assert!(token.is_expired_at(expires));
		assert!(token.is_expired_at(macros::datetime!(2025-01-01 02:00 UTC)));
	}

	#[test]
	fn token_expiring_now_is_expired() {
		let now = OffsetDateTime::now_utc();
		let token = Token::new("abc", now);

		assert!(token.is_expired());
		assert_eq!(token.expires_in_at(now), Duration::ZERO);
	}

	#[test]
	fn converts_from_response_and_reports_pending() {
		let response: AccessTokenResponse = serde_json::from_str(
			r#"{"access_token":"tok","expires_on":"1735693200","not_before":"1735689600","token_type":"Bearer","resource":"https://management.azure.com/"}"#,
		)
		.expect("Response fixture should deserialize.");
		let token = Token::try_from(response).expect("Response fixture should convert.");

		assert_eq!(token.value(), "tok");
		assert_eq!(token.expires_at(), macros::datetime!(2025-01-01 01:00 UTC));
		assert_eq!(token.token_type(), Some("Bearer"));
		assert_eq!(token.resource(), Some("https://management.azure.com/"));
		assert_eq!(token.status_at(macros::datetime!(2024-12-31 23:00 UTC)), TokenStatus::Pending);
		assert_eq!(token.status_at(macros::datetime!(2025-01-01 00:30 UTC)), TokenStatus::Active);
		assert_eq!(
			token.expires_in_at(macros::datetime!(2025-01-01 00:30 UTC)),
			Duration::minutes(30)
		);
	}

	#[test]
	fn debug_output_redacts_value() {
		let token = Token::new("super-secret", OffsetDateTime::now_utc());

		assert!(!format!("{token:?}").contains("super-secret"));
	}
}
