//! Recipient address validation.

use lettre::Address;

use crate::MailError;

/// Parses `input` as a bare `user@domain` address and returns it in the
/// form the session should store.
///
/// Display-name forms such as `"Name" <user@domain>` are rejected: the
/// stored address must be exactly the mailbox the link is delivered to.
///
/// # Errors
/// [`MailError::InvalidAddress`] if `input` is not a bare address.
pub fn parse_recipient(input: &str) -> Result<Address, MailError> {
    input.parse::<Address>().map_err(|e| MailError::InvalidAddress {
        address: input.to_string(),
        reason: e.to_string(),
    })
}
