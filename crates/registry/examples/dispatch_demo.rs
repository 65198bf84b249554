//! Demo of the dispatch registry surfaces
//!
//! Walks through the write surface (add/replace/remove), the read surface a
//! router uses to resolve calls, and the snapshot surface that carries state
//! across an upgrade of the surrounding router.

use switchboard_registry::{ExtensionRegistry, FileSnapshotStore};
use switchboard_types::{
    Extension, ExtensionFunction, ExtensionMetadata, ImplementationHandle, Selector,
};
use tempfile::TempDir;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("🔀 Switchboard Dispatch Registry Demo");
    println!("=====================================\n");

    let mut registry = ExtensionRegistry::new();

    // Step 1: Register extensions
    println!("1️⃣ Registering extensions...");
    registry.add_extension(
        Extension::new(
            ExtensionMetadata::new("accounts", ImplementationHandle::new(0xa1))
                .with_docs_url("https://example.com/docs/accounts"),
        )
        .with_function(ExtensionFunction::from_signature("balance_of(address)"))
        .with_function(ExtensionFunction::from_signature(
            "transfer(address,uint256)",
        ))
        .with_function(ExtensionFunction::receive()),
    )?;
    registry.add_extension(
        Extension::new(ExtensionMetadata::new(
            "governance",
            ImplementationHandle::new(0xb2),
        ))
        .with_function(ExtensionFunction::from_signature("propose(bytes)")),
    )?;
    let stats = registry.stats();
    println!(
        "   ✅ {} extension(s), {} routable function(s)\n",
        stats.extensions, stats.functions
    );

    // Step 2: Resolve calls the way a router would
    println!("2️⃣ Resolving selectors...");
    for signature in ["transfer(address,uint256)", "propose(bytes)"] {
        let selector = Selector::derive(signature);
        match registry.metadata_for_selector(selector) {
            Some(metadata) => println!(
                "   {} {} -> '{}' at {}",
                selector, signature, metadata.name, metadata.implementation
            ),
            None => println!("   {} {} -> unroutable", selector, signature),
        }
    }
    if let Some(fallback) = registry.metadata_for_selector(Selector::ZERO) {
        println!("   0x00000000 (receive) -> '{}'", fallback.name);
    }
    println!();

    // Step 3: Upgrade an extension in place
    println!("3️⃣ Replacing 'governance' with an upgraded implementation...");
    registry.replace_extension(
        Extension::new(ExtensionMetadata::new(
            "governance",
            ImplementationHandle::new(0xc3),
        ))
        .with_function(ExtensionFunction::from_signature("propose(bytes)"))
        .with_function(ExtensionFunction::from_signature("veto(uint256)")),
    )?;
    let selector = Selector::derive("propose(bytes)");
    if let Some(metadata) = registry.metadata_for_selector(selector) {
        println!(
            "   ✅ propose(bytes) now routes to {}\n",
            metadata.implementation
        );
    }

    // Step 4: Carry state across a router upgrade via a snapshot
    println!("4️⃣ Persisting and restoring through a file-backed store...");
    let temp = TempDir::new()?;
    let mut store = FileSnapshotStore::new(temp.path())?;
    registry.persist(&mut store)?;

    let restored = ExtensionRegistry::load(&store)?;
    println!(
        "   ✅ restored {} extension(s), integrity issues: {}\n",
        restored.stats().extensions,
        restored.verify_integrity().len()
    );

    // Step 5: Tear down
    println!("5️⃣ Removing 'accounts'...");
    let removed = registry.remove_extension("accounts")?;
    println!(
        "   ✅ removed '{}' with {} function(s)",
        removed.name(),
        removed.functions.len()
    );
    println!(
        "   transfer(address,uint256) routable: {}",
        registry
            .metadata_for_selector(Selector::derive("transfer(address,uint256)"))
            .is_some()
    );

    println!("\n✨ Demo complete");
    Ok(())
}
