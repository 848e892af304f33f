use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use dropfile_server::{Server, ServerConfig};

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer,
        }
    }

    async fn read_response(&mut self) -> Value {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.unwrap();
        serde_json::from_str(&line).unwrap()
    }

    async fn send(&mut self, request: Value) -> Value {
        self.send_raw(format!("{request}\n").as_bytes()).await
    }

    async fn send_raw(&mut self, bytes: &[u8]) -> Value {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
        self.read_response().await
    }
}

// Start a server on an ephemeral port backed by a temporary storage root
async fn start_test_server(max_clients: usize) -> (TempDir, std::net::SocketAddr) {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        port: 0,
        storage_root: dir.path().to_string_lossy().into_owned(),
        max_clients,
        max_upload_size_mb: 1,
        ..ServerConfig::default()
    };

    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move { server.start().await });
    (dir, addr)
}

#[tokio::test]
async fn test_full_session() {
    let (dir, addr) = start_test_server(4).await;
    let mut client = TestClient::connect(addr).await;

    let greeting = client.read_response().await;
    assert_eq!(greeting["code"], 220);

    let response = client.send(json!({"op": "list"})).await;
    assert_eq!(response["code"], 401);

    let response = client.send(json!({"op": "identify", "userId": "alice"})).await;
    assert_eq!(response["status"], "ok");

    let response = client
        .send(json!({"op": "create-directory", "folderPath": "", "directoryName": "docs"}))
        .await;
    assert_eq!(response["code"], 201);

    let response = client
        .send_raw(b"{\"op\":\"upload\",\"originalFilename\":\"hello.txt\",\"size\":5}\nhello")
        .await;
    assert_eq!(response["code"], 201);
    assert_eq!(response["data"]["path"], "hello.txt");

    let response = client
        .send(json!({
            "op": "move",
            "currentPath": "hello.txt",
            "destinationPath": "docs/hello.txt"
        }))
        .await;
    assert_eq!(response["status"], "ok");

    let response = client.send(json!({"op": "list", "showStructure": true})).await;
    assert_eq!(
        response["data"],
        json!({
            "name": "alice",
            "type": "directory",
            "children": [{
                "name": "docs",
                "type": "directory",
                "children": [{ "name": "hello.txt", "type": "file" }]
            }]
        })
    );

    let response = client
        .send(json!({"op": "delete", "folderPath": "..", "itemName": "bob"}))
        .await;
    assert_eq!(response["code"], 400);
    assert_eq!(response["kind"], "InvalidPath");

    let response = client.send_raw(b"not json\n").await;
    assert_eq!(response["code"], 400);

    let response = client.send(json!({"op": "quit"})).await;
    assert_eq!(response["code"], 221);

    let stored = dir.path().join("users").join("alice").join("docs").join("hello.txt");
    assert_eq!(std::fs::read(stored).unwrap(), b"hello");
}

#[tokio::test]
async fn test_identity_is_fixed_per_session() {
    let (_dir, addr) = start_test_server(4).await;
    let mut client = TestClient::connect(addr).await;
    client.read_response().await;

    let response = client.send(json!({"op": "identify", "userId": "../root"})).await;
    assert_eq!(response["kind"], "InvalidPath");

    client.send(json!({"op": "identify", "userId": "alice"})).await;
    let response = client.send(json!({"op": "identify", "userId": "bob"})).await;
    assert_eq!(response["code"], 409);
}

#[tokio::test]
async fn test_oversized_upload_is_refused() {
    let (_dir, addr) = start_test_server(4).await;
    let mut client = TestClient::connect(addr).await;
    client.read_response().await;
    client.send(json!({"op": "identify", "userId": "alice"})).await;

    let response = client
        .send(json!({"op": "upload", "originalFilename": "big.bin", "size": 10 * 1024 * 1024}))
        .await;
    assert_eq!(response["code"], 413);
}

#[tokio::test]
async fn test_upload_before_identify_skips_body() {
    let (dir, addr) = start_test_server(4).await;
    let mut client = TestClient::connect(addr).await;
    client.read_response().await;

    // The body looks like a request line and must not be run as one
    let mut request = br#"{"op":"upload","originalFilename":"x.bin","size":14}"#.to_vec();
    request.extend_from_slice(b"\n{\"op\":\"quit\"}\n");
    let response = client.send_raw(&request).await;
    assert_eq!(response["code"], 401);

    let response = client.send(json!({"op": "identify", "userId": "alice"})).await;
    assert_eq!(response["status"], "ok");

    let response = client.send(json!({"op": "list"})).await;
    assert_eq!(response["data"]["entries"], json!([]));
    assert!(!dir.path().join("users").join("alice").join("x.bin").exists());

    let mut second = TestClient::connect(addr).await;
    second.read_response().await;
    let response = second
        .send(json!({"op": "upload", "originalFilename": "big.bin", "size": 10 * 1024 * 1024}))
        .await;
    assert_eq!(response["code"], 413);
}

#[tokio::test]
async fn test_session_cap() {
    let (_dir, addr) = start_test_server(1).await;

    let mut first = TestClient::connect(addr).await;
    assert_eq!(first.read_response().await["code"], 220);

    let mut second = TestClient::connect(addr).await;
    assert_eq!(second.read_response().await["code"], 503);
}
