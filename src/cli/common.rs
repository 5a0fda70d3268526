//! Server assembly shared across CLI commands.

use std::sync::Arc;

use crate::config::{PreviewConfig, StrategyChoice};
use crate::embed::TransportScript;
use crate::probe::{CapabilityProbe, RegistrySurface, ServingStrategy};
use crate::registry::HandleRegistry;
use crate::rewrite::ReferenceRewriter;
use crate::server::HtmlServer;
use crate::source::{DiskSource, ProjectRoot};

/// Build an `HtmlServer` over the configured host directory.
pub fn build_server(config: &PreviewConfig) -> HtmlServer {
    let root = ProjectRoot::new(&config.project.root);
    let registry = Arc::new(HandleRegistry::new(&config.serve.namespace));
    let transport = TransportScript::from_config(config.serve.transport.as_deref());

    let probe = match config.serve.strategy {
        StrategyChoice::Auto => CapabilityProbe::new(Arc::new(RegistrySurface::new(registry.clone()))),
        StrategyChoice::Handle => CapabilityProbe::fixed(ServingStrategy::HandleUrl),
        StrategyChoice::Inline => CapabilityProbe::fixed(ServingStrategy::InlineMarkup),
    };

    let source = DiskSource::new(root.clone(), config.host_dir());
    let rewriter = ReferenceRewriter::new(transport.clone());

    HtmlServer::new(root, registry, Arc::new(source), Arc::new(rewriter), Arc::new(probe))
        .with_index(&config.project.index)
        .with_transport(transport)
}
