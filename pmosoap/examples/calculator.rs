//! Appelle le service SOAP public de calculatrice (dneonline.com).
//!
//! Usage: cargo run -p pmosoap --example calculator -- [a] [b] [--soap12]

use pmosoap::{
    CallMessage, ClientConfig, ExtensionConfig, MethodDescriptor, ServiceContract, SoapClient,
    SoapError, SoapExtension, SoapVersion, Value, ValueKind,
};
use std::sync::Arc;

const ENDPOINT: &str = "http://www.dneonline.com/calculator.asmx";

/// Affiche la taille de l'enveloppe à chaque étape
struct Trace;

impl SoapExtension for Trace {
    fn name(&self) -> &str {
        "trace"
    }

    fn process_message(&mut self, message: &mut CallMessage) -> Result<(), SoapError> {
        tracing::info!(
            method = %message.method().name,
            stage = ?message.stage(),
            bytes = message.stream().len(),
            "SOAP stage"
        );
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let soap12 = args.iter().any(|a| a == "--soap12");
    let numbers: Vec<i64> = args.iter().filter_map(|a| a.parse().ok()).collect();
    let a = numbers.first().copied().unwrap_or(2);
    let b = numbers.get(1).copied().unwrap_or(3);

    let mut builder = ServiceContract::builder("http://tempuri.org/")
        .url(ENDPOINT)
        .extension(ExtensionConfig::new(|_: &MethodDescriptor| {
            Box::new(Trace) as Box<dyn SoapExtension>
        }));
    for name in ["Add", "Subtract", "Multiply", "Divide"] {
        builder = builder.describe(name, |m| {
            m.param("intA", ValueKind::Int)
                .param("intB", ValueKind::Int)
                .result(&format!("{}Result", name), ValueKind::Int)
        });
    }
    let contract = Arc::new(builder.build());

    let config = ClientConfig {
        version: soap12.then_some(SoapVersion::Soap12),
        ..ClientConfig::load("pmosoap.yaml")?
    };
    let client = SoapClient::from_config(contract, &config)?;

    for name in ["Add", "Subtract", "Multiply", "Divide"] {
        match client.invoke(name, vec![Value::from(a), Value::from(b)]) {
            Ok(result) => println!(
                "{}({}, {}) = {}",
                name,
                a,
                b,
                result.value().cloned().unwrap_or(Value::Null)
            ),
            Err(SoapError::Fault(fault)) => println!("{} failed: {}", name, fault),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
