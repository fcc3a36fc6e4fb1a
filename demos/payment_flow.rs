use blackoin::{BlackoinClient, Client, Payment, PixPayment};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blackoin=debug")),
        )
        .init();

    // BLACKOIN_CLIENT_ID, BLACKOIN_CLIENT_SECRET and BLACKOIN_DEBUG
    let mut client = BlackoinClient::from_env();
    client.config().validate()?;

    let token = client.authenticate().await?;
    println!("Token type: {}, expires in {}s", token.token_type, token.expires_in);

    let methods = client.payment_methods().await?;
    println!("Payment methods: {methods:#}");

    let method_hash = env::var("BLACKOIN_PIX_METHOD").unwrap_or_default();
    let customer = Client::new()
        .with_identifier("demo-customer")
        .with_name("Maria Silva")
        .with_email("maria@example.com")
        .with_document("12345678901");
    let charge = PixPayment::new(Payment::new(1500, method_hash, customer)?);

    let created = match client.create_pix_payment(&charge).await {
        Ok(created) => created,
        Err(e) => {
            let reason = e.upstream_message().unwrap_or("no upstream message");
            eprintln!("Payment failed: {e} ({reason})");
            return Err(e.into());
        }
    };
    println!("Created {} ({})", created.txid, created.status);
    println!("PIX copia e cola: {}", created.pix_copia_e_cola);

    let status = client.payment_status(&created.txid).await?;
    println!("Status of {}: {} for {} cents", status.txid, status.status, status.amount);

    Ok(())
}
