use otf_ffi::{link_internal, parse_internal, roll_internal, VERSION};

fn main() {
    println!("FFI Version: {VERSION}");

    println!("parse [S:Broadsword+2 feint] = {}", parse_internal("[S:Broadsword+2 feint]"));
    println!("link = {}", link_internal("Swing [SW+1 cut] then [Dodge]"));

    let cfg = r#"{"otf": "CR: 12 Bloodlust", "seed": 42}"#;
    println!("Determinism check:");
    println!("  First call:  {}", roll_internal(cfg));
    println!("  Second call: {}", roll_internal(cfg));

    println!("error case: {}", roll_internal(r#"{"otf": "Dodge"}"#));
}
