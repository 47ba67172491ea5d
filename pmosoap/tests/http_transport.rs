use mockito::Matcher;
use pmosoap::{
    ClientConfig, ServiceContract, SoapClient, SoapError, SoapVersion, TransportError, Value,
    ValueKind,
};
use std::sync::Arc;

const NS: &str = "http://tempuri.org/";

fn contract(url: &str) -> Arc<ServiceContract> {
    Arc::new(
        ServiceContract::builder(NS)
            .url(url)
            .describe("Add", |m| {
                m.param("a", ValueKind::Int)
                    .param("b", ValueKind::Int)
                    .result("AddResult", ValueKind::Int)
            })
            .build(),
    )
}

fn config() -> ClientConfig {
    ClientConfig {
        user_agent: "pmosoap-test/1.0".to_string(),
        timeout_secs: 5,
        ..ClientConfig::default()
    }
}

const ADD_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <AddResponse xmlns="http://tempuri.org/"><AddResult>5</AddResult></AddResponse>
  </soap:Body>
</soap:Envelope>"#;

#[test]
fn soap11_request_over_http() -> anyhow::Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/calculator.asmx")
        .match_header("content-type", "text/xml; charset=utf-8")
        .match_header("soapaction", "\"http://tempuri.org/Add\"")
        .match_header("user-agent", "pmosoap-test/1.0")
        .match_body(Matcher::Regex("<a>2</a><b>3</b>".to_string()))
        .with_status(200)
        .with_header("content-type", "text/xml; charset=utf-8")
        .with_body(ADD_RESPONSE)
        .create();

    let url = format!("{}/calculator.asmx", server.url());
    let client = SoapClient::from_config(contract(&url), &config())?;
    let result = client.invoke("Add", vec![Value::from(2), Value::from(3)])?;

    assert_eq!(result.value(), Some(&Value::Int(5)));
    mock.assert();
    Ok(())
}

#[test]
fn soap12_request_carries_action_in_content_type() -> anyhow::Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/calculator.asmx")
        .match_header(
            "content-type",
            "application/soap+xml; charset=utf-8; action=\"http://tempuri.org/Add\"",
        )
        .match_header("soapaction", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(
            r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body>
               <AddResponse xmlns="http://tempuri.org/"><AddResult>7</AddResult></AddResponse>
               </env:Body></env:Envelope>"#,
        )
        .create();

    let url = format!("{}/calculator.asmx", server.url());
    let config = ClientConfig {
        version: Some(SoapVersion::Soap12),
        ..config()
    };
    let client = SoapClient::from_config(contract(&url), &config)?;
    assert_eq!(client.version(), SoapVersion::Soap12);

    let result = client.invoke("Add", vec![Value::from(3), Value::from(4)])?;
    assert_eq!(result.value(), Some(&Value::Int(7)));
    mock.assert();
    Ok(())
}

#[test]
fn http_500_fault_is_read() -> anyhow::Result<()> {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/calculator.asmx")
        .with_status(500)
        .with_header("content-type", "text/xml; charset=utf-8")
        .with_body(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>
               <soap:Fault><faultcode>soap:Server</faultcode><faultstring>Division by zero</faultstring></soap:Fault>
               </soap:Body></soap:Envelope>"#,
        )
        .create();

    let url = format!("{}/calculator.asmx", server.url());
    let client = SoapClient::from_config(contract(&url), &config())?;

    match client.invoke("Add", vec![Value::from(1), Value::from(0)]) {
        Err(SoapError::Fault(fault)) => {
            assert_eq!(fault.code, SoapVersion::Soap11.server_code());
            assert_eq!(fault.reason, "Division by zero");
        }
        other => panic!("expected a fault, got {:?}", other),
    }
    Ok(())
}

#[test]
fn http_404_is_a_status_error() -> anyhow::Result<()> {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/calculator.asmx")
        .with_status(404)
        .with_body("not here")
        .create();

    let url = format!("{}/calculator.asmx", server.url());
    let client = SoapClient::from_config(contract(&url), &config())?;

    let err = client
        .invoke("Add", vec![Value::from(1), Value::from(2)])
        .unwrap_err();
    assert!(matches!(
        err,
        SoapError::Transport(TransportError::Status { code: 404, .. })
    ));
    Ok(())
}

#[test]
fn unreachable_endpoint_is_a_connection_error() -> anyhow::Result<()> {
    // port 9 (discard) : rien n'y écoute sur une machine de test
    let client = SoapClient::from_config(contract("http://127.0.0.1:9/svc"), &config())?;

    let err = client
        .invoke("Add", vec![Value::from(1), Value::from(2)])
        .unwrap_err();
    assert!(matches!(
        err,
        SoapError::Transport(TransportError::Connection(_) | TransportError::Io(_))
    ));
    Ok(())
}

#[test]
fn large_response_body_is_read_whole() -> anyhow::Result<()> {
    let payload = "x".repeat(11 * 1024 * 1024);
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/echo.asmx")
        .with_status(200)
        .with_header("content-type", "text/xml; charset=utf-8")
        .with_body(format!(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><EchoResponse xmlns="http://tempuri.org/"><EchoResult>{}</EchoResult></EchoResponse></soap:Body></soap:Envelope>"#,
            payload
        ))
        .create();

    let contract = ServiceContract::builder(NS)
        .url(format!("{}/echo.asmx", server.url()))
        .describe("Echo", |m| {
            m.param("text", ValueKind::String)
                .result("EchoResult", ValueKind::String)
        })
        .build();
    let client = SoapClient::from_config(Arc::new(contract), &config())?;

    let result = client.invoke("Echo", vec![Value::from("x")])?;
    assert_eq!(result.value(), Some(&Value::String(payload)));
    Ok(())
}
