mod codelens;
mod command;

pub use codelens::CodeLensHandler;
pub use command::{
    command_names, document_edit, parse_arguments, workspace_edit, ApplyAllArgs,
    ApplyIdentificationArgs, IdentificationCommandHandler, APPLY_ALL_IDENTIFICATIONS,
    APPLY_IDENTIFICATION, APPLY_WORKSPACE_IDENTIFICATIONS,
};
