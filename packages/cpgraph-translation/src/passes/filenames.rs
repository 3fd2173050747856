//! Filename mapping: translation units end up named after their file,
//! not whatever the frontend put there. Runs last.

use crate::pass::{GraphDelta, Pass, PassContext, PassDescriptor, PassRegistration};
use cpgraph_core::TranslationResult;
use std::sync::Arc;

static DESCRIPTOR: PassDescriptor = PassDescriptor {
    name: "filename-mapper",
    hard_deps: &[],
    soft_deps: &[],
    execute_before: &[],
    first: false,
    last: true,
    parallel_safe: true,
};

pub struct FilenameMapper;

pub(crate) fn registration() -> PassRegistration {
    PassRegistration::new(&DESCRIPTOR, || Arc::new(FilenameMapper))
}

impl Pass for FilenameMapper {
    fn descriptor(&self) -> &'static PassDescriptor {
        &DESCRIPTOR
    }

    fn accept(
        &self,
        result: &TranslationResult,
        _ctx: &PassContext<'_>,
    ) -> crate::error::Result<GraphDelta> {
        let mut delta = GraphDelta::default();
        for &unit in result.translation_units() {
            let Some(node) = result.node(unit) else {
                continue;
            };
            let Some(file_name) = node
                .location
                .as_ref()
                .and_then(|loc| loc.file.file_name())
                .and_then(|name| name.to_str())
            else {
                continue;
            };
            if node.name != file_name {
                delta.renames.push((unit, file_name.to_string()));
            }
        }
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::testutil::{context, run_pass};
    use cpgraph_core::{Node, NodeKind, SourceLocation};

    #[test]
    fn test_units_are_renamed_to_their_file_name() {
        let ctx = context();
        let mut result = TranslationResult::new();
        let unit = result
            .add_node(
                Node::new(
                    ctx.node_ids.next_id(),
                    NodeKind::TranslationUnit,
                    "src/deep/path/main.c",
                )
                .with_location(SourceLocation::file_only("src/deep/path/main.c")),
            )
            .unwrap();
        result.add_translation_unit(unit).unwrap();

        run_pass(&FilenameMapper, &mut result, &ctx);
        assert_eq!(result.node(unit).unwrap().name, "main.c");
    }

    #[test]
    fn test_unit_without_location_is_untouched() {
        let ctx = context();
        let mut result = TranslationResult::new();
        let unit = result
            .add_node(Node::new(ctx.node_ids.next_id(), NodeKind::TranslationUnit, "merged"))
            .unwrap();
        result.add_translation_unit(unit).unwrap();

        run_pass(&FilenameMapper, &mut result, &ctx);
        assert_eq!(result.node(unit).unwrap().name, "merged");
    }
}
