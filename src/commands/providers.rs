use anyhow::Result;

use crate::provider::ProviderRegistry;

fn format_providers(registry: &ProviderRegistry) -> Vec<String> {
    registry
        .iter()
        .map(|(id, template)| {
            let marker = if id == registry.default_provider() {
                "*"
            } else {
                " "
            };
            format!("{} {}  {}", marker, id, template)
        })
        .collect()
}

/// Print the provider table; the default is marked with `*`.
pub fn providers(registry: &ProviderRegistry) -> Result<()> {
    for line in format_providers(registry) {
        println!("{}", line);
    }
    Ok(())
}
