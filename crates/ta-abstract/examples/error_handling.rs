//! Error Handling Examples
//!
//! Walks through the errors a generic caller meets when driving functions
//! through handles and param holders.
//!
//! Run with: `cargo run --example error_handling`

use ta_abstract::{Error, Registry};

fn main() {
    let registry = Registry::global();
    let data: Vec<f64> = (0..10).map(f64::from).collect();
    let mut out = vec![0.0; data.len()];
    println!("=== Error Handling Examples ===");
    println!();

    // Example 1: Unknown name
    println!("1. Unknown function:");
    match registry.lookup("SMAX") {
        Ok(_) => println!("   Unexpected success"),
        Err(Error::FunctionNotFound { name }) => {
            println!("   Caught FunctionNotFound for '{name}' (expected)");
            println!("   Fix: names are case-sensitive, list them with Registry::iter");
        }
        Err(e) => println!("   Unexpected error: {e}"),
    }
    println!();

    let Ok(handle) = registry.lookup("SMA") else {
        println!("SMA is not registered");
        return;
    };
    let Ok(mut holder) = registry.alloc(handle) else {
        println!("holder allocation failed");
        return;
    };

    // Example 2: Calling before binding
    println!("2. Inputs not bound:");
    match holder.call(0, 9) {
        Ok(_) => println!("   Unexpected success"),
        Err(Error::InputsNotFullyBound { missing }) => {
            println!("   Caught InputsNotFullyBound, {missing} slot(s) missing (expected)");
        }
        Err(e) => println!("   Unexpected error: {e}"),
    }
    println!();

    // Example 3: Wrong kind for a slot
    println!("3. Wrong parameter type:");
    match holder.set_input_integer(0, &[1, 2, 3]) {
        Ok(()) => println!("   Unexpected success"),
        Err(e @ Error::WrongParameterType { .. }) => {
            println!("   Caught: {e}");
            println!("   Return code: {}", e.ret_code());
        }
        Err(e) => println!("   Unexpected error: {e}"),
    }
    println!();

    // Example 4: Optional value outside its domain surfaces on use
    println!("4. Optional input out of domain:");
    let bound = [
        holder.set_input_real(0, &data),
        holder.set_output_real(0, &mut out),
        holder.set_opt_input_integer(0, 1),
    ];
    for e in bound.into_iter().filter_map(Result::err) {
        println!("   Unexpected bind error: {e}");
    }
    match holder.lookback() {
        Ok(n) => println!("   Unexpected lookback {n}"),
        Err(e) => println!("   Caught: {e}"),
    }
    println!();

    // Example 5: Using a released holder
    println!("5. Released holder:");
    holder.release();
    match holder.call(0, 9) {
        Ok(_) => println!("   Unexpected success"),
        Err(e) => println!("   Caught: {e} (code {})", e.ret_code()),
    }
}
