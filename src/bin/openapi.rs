use anyhow::Result;

// Print the OpenAPI document generated from the router wiring.
fn main() -> Result<()> {
    let spec = userdesk::api::openapi();
    println!("{}", spec.to_pretty_json()?);
    Ok(())
}
