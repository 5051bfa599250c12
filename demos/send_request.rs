use std::sync::Arc;

use request_sender::model::{Header, Request, RequestGroup};
use request_sender::store::{InMemoryStore, Store};
use request_sender::{Dispatcher, SendError, SenderConfig};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Usage: send_request [url-template] [host]
    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "{{ host }}/get".to_string());
    let host = args.next().unwrap_or_else(|| "httpbin.org".to_string());

    // Set up a group with an environment, and one request inside it. The URL may
    // use {{ host }}, which is resolved right before sending.
    let store = Arc::new(InMemoryStore::new());
    let env = json!({ "host": host });
    let group = RequestGroup::new("Demo").with_environment(env.as_object().cloned().unwrap_or_default());
    let mut request = Request::new(group.id, "GET", url);
    request.headers.push(Header::new("Accept", "application/json"));
    store.request_group_put(&group)?;
    store.request_put(&request)?;

    let config = SenderConfig::builder().build()?;
    let dispatcher = Dispatcher::with_store(store.clone(), Some(config));

    let handle = dispatcher.send(request.id, |res: Result<(), SendError>| match res {
        Ok(()) => println!("Send completed"),
        Err(e) => println!("Send failed: {e}"),
    });

    match handle.join().await {
        Ok(response) => {
            println!("Recorded response {} in {}ms", response.id, response.millis());
            match response.status_code() {
                Some(code) => {
                    println!("Status: {code}");
                    println!("{}", response.body_text().unwrap_or_default());
                }
                None => println!("Error: {}", response.error().unwrap_or_default()),
            }
        }
        Err(e) => println!("Nothing recorded: {e}"),
    }

    println!("History size: {}", store.responses_for_request(request.id)?.len());
    Ok(())
}
