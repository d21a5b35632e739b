use resembed_gen::Embed;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Embed::new("target1").root("resources").build()?;

    // Mounted under the same prefix as target1, so both targets share paths.
    Embed::new("target2")
        .root_with_prefix("target2/resources", "resources")
        .build()?;

    Ok(())
}
