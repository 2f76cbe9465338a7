// Metapackage for the workspace-level integration tests.
// The member crates are pulled in as regular dependencies; see tests/.
