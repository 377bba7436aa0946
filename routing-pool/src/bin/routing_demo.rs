//! Drives a small screen stack through a configuration feature and prints
//! the final pool summary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use routing_pool::logging::init_tracing;
use routing_pool::transition::TimelineHandler;
use routing_pool::{
    ConfigurationFeature, FeatureConfig, Node, ParentContext, RoutingActivator, RoutingChange,
    RoutingCommand, TransitionDescriptor, View, ViewHandle,
};

type Screen = &'static str;

struct ScreenView(Screen);

impl View for ScreenView {
    fn set_visible(&self, visible: bool) {
        tracing::debug!(screen = self.0, visible, "View visibility changed");
    }
}

struct LoggingActivator;

impl RoutingActivator<Screen> for LoggingActivator {
    fn activate(&self, routing: &Screen, node: &Node) {
        tracing::info!(screen = *routing, node = ?node.id(), "Activate");
    }

    fn deactivate(&self, routing: &Screen, node: &Node) {
        tracing::info!(screen = *routing, node = ?node.id(), "Deactivate");
    }

    fn destroy(&self, routing: &Screen, node: &Node) {
        tracing::info!(screen = *routing, node = ?node.id(), "Destroy");
    }
}

fn push(stack: &[Screen], top: Screen) -> RoutingChange<Screen> {
    let mut next = stack.to_vec();
    next.push(top);
    let mut changeset = vec![RoutingCommand::Add(top), RoutingCommand::Activate(top)];
    if let Some(below) = stack.last() {
        changeset.push(RoutingCommand::Deactivate(*below));
    }
    RoutingChange::new(TransitionDescriptor::new(stack.to_vec(), next), changeset)
}

fn pop(stack: &[Screen]) -> Option<RoutingChange<Screen>> {
    let (top, rest) = stack.split_last()?;
    let mut changeset = vec![RoutingCommand::Remove(*top)];
    if let Some(below) = rest.last() {
        changeset.push(RoutingCommand::Activate(*below));
    }
    Some(RoutingChange::new(
        TransitionDescriptor::new(stack.to_vec(), rest.to_vec()),
        changeset,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let resolver = |screen: &Screen, parent: &ParentContext| {
        let view: ViewHandle = Arc::new(ScreenView(*screen));
        Node::new(parent, Some(view))
    };
    let config = FeatureConfig::from_env()
        .with_transition_handler(Arc::new(TimelineHandler::new(Duration::from_millis(250))));
    let feature = ConfigurationFeature::spawn(
        Arc::new(resolver),
        Arc::new(LoggingActivator),
        ParentContext::new(),
        config,
    );

    feature
        .execute(push(&[], "home"))
        .await
        .context("push home")?
        .wait()
        .await?;

    let details = feature
        .execute(push(&["home"], "details"))
        .await
        .context("push details")?;

    // Back out before the push animation completes; the running transition reverses.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let back = pop(&["home", "details"]).context("stack is empty")?;
    let back = feature.execute(back).await.context("pop details")?;

    details.wait().await?;
    back.wait().await?;

    let state = feature.snapshot().await?;
    println!("{}", serde_json::to_string_pretty(&state.summary())?);
    Ok(())
}
