use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use restline::channel::{pump, BufferPool, Contexts};
use restline::config::Config;
use restline::http::writer::ResponseWriter;
use restline::http::{Method, Request, RequestBuilder, Response};
use restline::resource::{RouteTable, RouteTableBuilder};
use restline::sample::DataResource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(EnvFilter::new(&cfg.logging.level))
        .init();

    let resource = DataResource::new();
    let mut builder = RouteTableBuilder::default();
    resource.register(&mut builder)?;
    let table = Arc::new(builder.build());

    let pool = BufferPool::new(cfg.transport.buffer_size, cfg.transport.pool_capacity);
    let contexts = Contexts::new(cfg.parser.limits());

    let (context, summary) = contexts.open(|response: Response| {
        tracing::info!(
            status = response.status.as_u16(),
            location = response.header("Location").unwrap_or(""),
            body = %response.body_text(),
            "Received response"
        );
    });

    let (mut near, far) = tokio::io::duplex(cfg.transport.buffer_size);
    let reader = {
        let context = context.clone();
        let pool = pool.clone();
        tokio::spawn(async move { pump(far, &pool, &context).await })
    };

    for request in script()? {
        let response = dispatch(&table, request).await?;
        ResponseWriter::new(&response)
            .write_chunked(&mut near, cfg.demo.chunk_size)
            .await?;
    }

    // A completion routed straight back to the context, bypassing the wire.
    let late = table.dispatch(Request::new(Method::GET, "/res?limit=1"))?;
    context.respond(late).await?;

    near.shutdown().await?;
    drop(near);

    let delivered = reader.await??;
    let summary = summary.await?;
    tracing::info!(
        delivered,
        forwarded = summary.forwarded,
        end = ?summary.end,
        outstanding = pool.outstanding(),
        "Demo finished"
    );
    Ok(())
}

async fn dispatch(table: &RouteTable, request: Request) -> anyhow::Result<Response> {
    tracing::info!(method = %request.method, path = %request.path, "Dispatching");
    Ok(table.dispatch(request)?.await)
}

fn script() -> anyhow::Result<Vec<Request>> {
    let create = |body: &str| {
        RequestBuilder::new()
            .method(Method::POST)
            .path("/res")
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .build()
            .map_err(anyhow::Error::msg)
    };

    Ok(vec![
        create(r#"{"name":"alpha","description":"first"}"#)?,
        create(r#"{"name":"beta"}"#)?,
        Request::new(Method::GET, "/res/1"),
        Request::new(Method::GET, "/res?limit=5"),
        Request::new(Method::DELETE, "/res/2"),
        Request::new(Method::GET, "/res/2"),
        Request::new(Method::PUT, "/res/1"),
        Request::new(Method::GET, "/res/abc"),
        create("not json")?,
    ])
}
