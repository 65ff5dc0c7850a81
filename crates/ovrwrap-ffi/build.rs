const REVISIONS: [&str; 5] = ["0_4", "0_5", "0_6", "0_7", "0_8"];

fn main() {
    let values = REVISIONS
        .iter()
        .map(|rev| format!("\"{rev}\""))
        .collect::<Vec<_>>()
        .join(", ");
    println!("cargo:rustc-check-cfg=cfg(export_abi, values({values}))");

    let enabled: Vec<&str> = REVISIONS
        .iter()
        .copied()
        .filter(|rev| std::env::var_os(format!("CARGO_FEATURE_ABI_{rev}")).is_some())
        .collect();

    if enabled.len() > 1 {
        println!(
            "cargo:warning=several legacy ABIs enabled ({}); exporting the newest",
            enabled.join(", ")
        );
    }
    if let Some(rev) = enabled.last() {
        println!("cargo:rustc-cfg=export_abi=\"{rev}\"");
    }
}
