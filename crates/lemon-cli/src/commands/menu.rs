//! Menu command implementation.

use anyhow::Result;
use colored::Colorize;

use crate::context::Context;
use crate::output;

pub async fn run(ctx: &Context) -> Result<()> {
    ctx.manager.initialize().await;
    let sections = ctx.manager.api().get_menu_items().await?;

    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            println!();
        }
        output::heading(&section.title);
        for item in &section.items {
            println!("  {} {}", item.name, item.price.green());
            if let Some(ref description) = item.description {
                println!("    {}", description.dimmed());
            }
        }
    }

    Ok(())
}
