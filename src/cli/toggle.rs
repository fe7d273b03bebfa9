use crate::cli::show::label_text;
use crate::cli::{open_store, Switch};
use crate::db::save_notebook;
use crate::error::Result;
use crate::notebook::Notebook;
use crate::settings::load_settings;

fn apply(block: &str, f: impl FnOnce(&mut Notebook) -> Result<()>) -> Result<Notebook> {
    let settings = load_settings();
    let (conn, mut notebook) = open_store(&settings)?;
    f(&mut notebook)?;
    save_notebook(&conn, &notebook)?;
    tracing::debug!(block, "toggles saved");
    Ok(notebook)
}

fn on_off(switch: Switch) -> &'static str {
    if switch.is_on() { "on" } else { "off" }
}

pub fn rows(block: &str, switch: Switch) -> Result<()> {
    let notebook = apply(block, |nb| nb.set_toggle(block, switch.is_on()))?;
    let visible = notebook.render_block(block)?.rows.len();
    println!("Show all rows for {block}: {} ({visible} visible rows)", on_off(switch));
    Ok(())
}

pub fn visibility(block: &str, switch: Switch) -> Result<()> {
    let notebook = apply(block, |nb| nb.set_visibility(block, switch.is_on()))?;
    println!(
        "Show note {block}: {} (note {})",
        on_off(switch),
        label_text(notebook.label(block))
    );
    Ok(())
}

pub fn always_show(block: &str, switch: Switch) -> Result<()> {
    let notebook = apply(block, |nb| nb.set_always_show(block, switch.is_on()))?;
    println!(
        "Always show {block}: {} (note {})",
        on_off(switch),
        label_text(notebook.label(block))
    );
    Ok(())
}
