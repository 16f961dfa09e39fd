use stripe::Client;

/// Stripe secret keys always carry the `sk_` prefix; anything else means
/// the integration is switched off.
pub fn is_secret_key(secret_key: &str) -> bool {
    secret_key.starts_with("sk_")
}

/// Builds a Stripe client, or `None` when no usable secret key is configured.
pub fn create_client(secret_key: &str) -> Option<Client> {
    if is_secret_key(secret_key) {
        Some(Client::new(secret_key))
    } else {
        None
    }
}
