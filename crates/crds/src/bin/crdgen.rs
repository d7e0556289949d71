//! Prints the EgressOps CRD manifests as YAML to stdout.
//!
//! Usage: `cargo run --bin crdgen > deploy/crds.yaml`

use kube::CustomResourceExt;

fn main() {
    match serde_yaml::to_string(&crds::EgressIPClaim::crd()) {
        Ok(manifest) => print!("{}", manifest),
        Err(e) => {
            eprintln!("Failed to render EgressIPClaim CRD: {}", e);
            std::process::exit(1);
        }
    }
}
