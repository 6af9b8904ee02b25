//! Hello server
//!
//! ```text
//! cargo run -p routekit-core --example hello
//! curl 'http://127.0.0.1:8000/hello?echo=10'
//! curl 'http://127.0.0.1:8000/greet/ada?shout=yes'
//! curl 'http://127.0.0.1:8000/routes'
//! ```

use routekit_core::{
    blocking, init_tracing, Contract, ContractFields, HeaderParam, Json, PathComponent,
    QueryParam, Response, ResponseVariant, RouteContract, Routes, ScalarType, Server,
    ServerConfig, TypedRequest,
};
use serde_json::Value;

#[derive(ContractFields)]
struct Hello {
    echo: QueryParam<i64>,
    fail_hard: QueryParam<String>,
    success: ResponseVariant<String>,
    bad_request: ResponseVariant<()>,
}

impl RouteContract for Hello {
    type RequestBody = ();
}

#[derive(ContractFields)]
struct Greet {
    shout: QueryParam<bool>,
    agent: HeaderParam<String>,
    ok: ResponseVariant<Json<Value>>,
}

impl RouteContract for Greet {
    type RequestBody = ();
}

#[derive(ContractFields)]
struct Index {
    ok: ResponseVariant<Json<Value>>,
}

impl RouteContract for Index {
    type RequestBody = ();
}

async fn hello(req: TypedRequest<Hello>) -> routekit_core::Result<Response> {
    let contract = req.contract();
    if req.query().get(&contract.fail_hard).is_some() {
        return req.respond(&contract.bad_request).empty().await;
    }
    let body = req
        .query()
        .get(&contract.echo)
        .map_or_else(|| "Hello".to_string(), |echo| echo.to_string());
    req.respond(&contract.success).encode(body).await
}

fn greet(req: TypedRequest<Greet>) -> routekit_core::Result<Response> {
    let contract = req.contract();
    let name: String = req.path_param("name").unwrap_or_default();
    let name = if req.query().get(&contract.shout).unwrap_or_default() {
        name.to_uppercase()
    } else {
        name
    };
    let agent = req.headers().get(&contract.agent);
    req.respond(&contract.ok)
        .encode_blocking(Json(serde_json::json!({ "hello": name, "agent": agent })))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,routekit_core=debug");

    let mut routes = Routes::new();

    routes.get(
        "/hello",
        Contract::new(Hello {
            echo: QueryParam::new("echo").description("Integer echoed back"),
            fail_hard: QueryParam::new("failHard").description("Answer 400 when present"),
            success: ResponseVariant::status(200),
            bad_request: ResponseVariant::canned(Response::empty(400)),
        }),
        hello,
    )?;

    routes.get(
        vec![
            PathComponent::constant("greet"),
            PathComponent::param("name")
                .typed(ScalarType::String)
                .describe("Who to greet"),
        ],
        Contract::new(Greet {
            shout: QueryParam::new("shout").default_value(false),
            agent: HeaderParam::new("user-agent"),
            ok: ResponseVariant::status(200),
        }),
        blocking(greet),
    )?;

    let docs: Value = serde_json::from_str(&routes.registry().to_json()?)?;
    routes.get(
        "/routes",
        Contract::new(Index {
            ok: ResponseVariant::status(200),
        }),
        move |req: TypedRequest<Index>| {
            let docs = docs.clone();
            async move { req.respond(&req.contract().ok).encode(Json(docs)).await }
        },
    )?;

    let server = Server::new(routes, ServerConfig::from_env());
    server.serve().await?;
    Ok(())
}
