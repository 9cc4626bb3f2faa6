//! Interactive menu shell.
//!
//! Mirrors the three role menus: institutions file requests and follow
//! their own, donors browse approved requests, administrators review
//! everything and can lock accounts out. Input comes from a [`LineSource`] so the whole flow can be
//! driven by a script in tests; output goes to any [`Write`].

use std::io::Write;
use std::str::FromStr;

use donation_desk_core::{Email, Item, RequestId, RequestStatus, Role, UserId};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use crate::error::CommandError;
use crate::render;
use crate::workspace::Workspace;

/// Where the shell reads its input from.
pub trait LineSource {
    /// Show `prompt` and read one line. `Ok(None)` once input has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying terminal fails.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, CommandError>;
}

/// Terminal input with history, backed by `rustyline`.
pub struct Editor(DefaultEditor);

impl Editor {
    /// Attach to the controlling terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be configured.
    pub fn new() -> Result<Self, CommandError> {
        Ok(Self(DefaultEditor::new()?))
    }
}

impl LineSource for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, CommandError> {
        match self.0.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    // History is best effort.
                    let _ = self.0.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// The menu loop over one [`Workspace`].
pub struct Shell<'a, L, W> {
    workspace: &'a mut Workspace,
    input: L,
    out: W,
}

impl<'a, L: LineSource, W: Write> Shell<'a, L, W> {
    pub const fn new(workspace: &'a mut Workspace, input: L, out: W) -> Self {
        Self {
            workspace,
            input,
            out,
        }
    }

    /// Give back the output sink.
    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Run until the user quits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input, writing output or saving fails.
    pub fn run(&mut self) -> Result<(), CommandError> {
        match self.main_menu() {
            Err(CommandError::EndOfInput) => {
                writeln!(self.out)?;
                debug!("Input ended, leaving shell");
                Ok(())
            }
            other => other,
        }
    }

    fn main_menu(&mut self) -> Result<(), CommandError> {
        loop {
            writeln!(self.out, "\n=== Donation Desk ===")?;
            writeln!(self.out, "1. Log in")?;
            writeln!(self.out, "2. Register")?;
            writeln!(self.out, "0. Quit")?;
            match self.prompt("> ")?.as_str() {
                "1" => self.login()?,
                "2" => self.register()?,
                "0" => {
                    writeln!(self.out, "Goodbye.")?;
                    return Ok(());
                }
                _ => writeln!(self.out, "Invalid option.")?,
            }
        }
    }

    fn login(&mut self) -> Result<(), CommandError> {
        let email = self.prompt("Email: ")?;
        let secret = self.prompt("Password: ")?;

        let (name, role) = match self.workspace.ledger_mut().authenticate(&email, &secret) {
            Ok(user) => (user.name.clone(), user.role),
            Err(e) => {
                writeln!(self.out, "{e}")?;
                return Ok(());
            }
        };
        info!(%email, %role, "Logged in");
        writeln!(self.out, "Welcome, {name}!")?;

        let result = match role {
            Role::Institution => self.institution_menu(),
            Role::Donor => self.donor_menu(),
            Role::Administrator => self.admin_menu(),
        };
        self.workspace.ledger_mut().end_session();
        result
    }

    fn register(&mut self) -> Result<(), CommandError> {
        let name = self.prompt("Name: ")?;
        let email = self.prompt("Email: ")?;
        if let Err(e) = Email::parse(email.as_str()) {
            writeln!(self.out, "Invalid email: {e}")?;
            return Ok(());
        }
        let secret = self.prompt("Password: ")?;
        writeln!(self.out, "Account type:")?;
        writeln!(self.out, "1. Institution")?;
        writeln!(self.out, "2. Donor")?;
        let role = match self.prompt("> ")?.as_str() {
            "1" => Role::Institution,
            "2" => Role::Donor,
            _ => {
                writeln!(self.out, "Invalid option.")?;
                return Ok(());
            }
        };

        match self
            .workspace
            .ledger_mut()
            .register(&name, &email, &secret, role)
        {
            Ok(user) => {
                let id = user.id;
                info!(%id, %email, %role, "Registered user");
                writeln!(self.out, "Account created.")?;
                self.workspace.persist()
            }
            Err(e) => Ok(writeln!(self.out, "{e}")?),
        }
    }

    fn institution_menu(&mut self) -> Result<(), CommandError> {
        loop {
            writeln!(self.out, "\n--- Institution ---")?;
            writeln!(self.out, "1. New request")?;
            writeln!(self.out, "2. My requests")?;
            writeln!(self.out, "0. Log out")?;
            match self.prompt("> ")?.as_str() {
                "1" => self.new_request()?,
                "2" => self.browse()?,
                "0" => return Ok(()),
                _ => writeln!(self.out, "Invalid option.")?,
            }
        }
    }

    fn new_request(&mut self) -> Result<(), CommandError> {
        let justification = self.prompt("Justification: ")?;
        let mut items = Vec::new();
        loop {
            let product_name = self.prompt("Product (blank to finish): ")?;
            if product_name.is_empty() {
                break;
            }
            let quantity = loop {
                let quantity: u32 = self.prompt_number("Quantity: ")?;
                if quantity > 0 {
                    break quantity;
                }
                writeln!(self.out, "Quantity must be positive.")?;
            };
            let category = self.prompt("Category: ")?;
            items.push(Item::new(product_name, quantity, category)?);
        }

        match self
            .workspace
            .ledger_mut()
            .create_request(&justification, items)
        {
            Ok(id) => {
                info!(%id, "Created request");
                writeln!(self.out, "Request #{id} created.")?;
                self.workspace.persist()
            }
            Err(e) => Ok(writeln!(self.out, "{e}")?),
        }
    }

    fn donor_menu(&mut self) -> Result<(), CommandError> {
        loop {
            writeln!(self.out, "\n--- Donor ---")?;
            writeln!(self.out, "1. Approved requests")?;
            writeln!(self.out, "0. Log out")?;
            match self.prompt("> ")?.as_str() {
                "1" => self.browse()?,
                "0" => return Ok(()),
                _ => writeln!(self.out, "Invalid option.")?,
            }
        }
    }

    /// Show the visible requests, then details for one picked by ID.
    fn browse(&mut self) -> Result<(), CommandError> {
        if let Some(id) = self.pick_request()? {
            if let Some(request) = self.workspace.ledger().get_request(id) {
                render::write_details(&mut self.out, request)?;
            }
        }
        Ok(())
    }

    fn admin_menu(&mut self) -> Result<(), CommandError> {
        loop {
            writeln!(self.out, "\n--- Administrator ---")?;
            render::write_summary(&mut self.out, self.workspace.ledger().summary())?;
            writeln!(self.out, "1. Manage requests")?;
            writeln!(self.out, "2. Manage users")?;
            writeln!(self.out, "0. Log out")?;
            match self.prompt("> ")?.as_str() {
                "1" => self.review()?,
                "2" => self.manage_users()?,
                "0" => return Ok(()),
                _ => writeln!(self.out, "Invalid option.")?,
            }
        }
    }

    fn review(&mut self) -> Result<(), CommandError> {
        let Some(id) = self.pick_request()? else {
            return Ok(());
        };
        if let Some(request) = self.workspace.ledger().get_request(id) {
            render::write_details(&mut self.out, request)?;
        }

        writeln!(self.out, "1. Approve")?;
        writeln!(self.out, "2. Reject")?;
        writeln!(self.out, "3. Back to pending")?;
        writeln!(self.out, "0. Cancel")?;
        let result = match self.prompt("> ")?.as_str() {
            "1" => self
                .workspace
                .ledger_mut()
                .set_status_typed(id, RequestStatus::Approved),
            "2" => {
                let reason = self.prompt("Reason (optional): ")?;
                self.workspace.ledger_mut().reject_with_reason(id, &reason)
            }
            "3" => self
                .workspace
                .ledger_mut()
                .set_status_typed(id, RequestStatus::Pending),
            "0" => return Ok(()),
            _ => {
                writeln!(self.out, "Invalid option.")?;
                return Ok(());
            }
        };

        match result {
            Ok(()) => {
                info!(%id, "Updated request status");
                writeln!(self.out, "Status updated.")?;
                self.workspace.persist()
            }
            Err(e) => Ok(writeln!(self.out, "{e}")?),
        }
    }

    /// List every account and flip the active flag of the one picked.
    fn manage_users(&mut self) -> Result<(), CommandError> {
        let flags: Vec<(UserId, bool)> = {
            let users = match self.workspace.ledger().list_users() {
                Ok(users) => users,
                Err(e) => return Ok(writeln!(self.out, "{e}")?),
            };
            render::write_users(&mut self.out, &users)?;
            users.iter().map(|user| (user.id, user.active)).collect()
        };

        let id: i32 = self.prompt_number("User ID to activate/deactivate (0 to go back): ")?;
        if id == 0 {
            return Ok(());
        }
        let id = UserId::new(id);
        let Some(&(_, active)) = flags.iter().find(|(user, _)| *user == id) else {
            return Ok(writeln!(self.out, "User #{id} not found.")?);
        };

        match self.workspace.ledger_mut().set_user_active(id, !active) {
            Ok(user) => {
                let state = if user.active { "activated" } else { "deactivated" };
                info!(%id, state, "Changed user active flag");
                writeln!(self.out, "User #{id} {state}.")?;
                self.workspace.persist()
            }
            Err(e) => Ok(writeln!(self.out, "{e}")?),
        }
    }

    /// List the requests visible to the session and ask for one of them.
    /// `None` when the user goes back or picks an ID outside the list.
    fn pick_request(&mut self) -> Result<Option<RequestId>, CommandError> {
        let visible: Vec<RequestId> = {
            let requests = self.workspace.ledger().list_requests();
            render::write_table(&mut self.out, &requests)?;
            requests.iter().map(|request| request.id).collect()
        };
        if visible.is_empty() {
            return Ok(None);
        }

        let id: i32 = self.prompt_number("Request ID for details (0 to go back): ")?;
        if id == 0 {
            return Ok(None);
        }
        let id = RequestId::new(id);
        if visible.contains(&id) {
            Ok(Some(id))
        } else {
            writeln!(self.out, "Request #{id} not found.")?;
            Ok(None)
        }
    }

    fn prompt(&mut self, prompt: &str) -> Result<String, CommandError> {
        self.input
            .read_line(prompt)?
            .map(|line| line.trim().to_owned())
            .ok_or(CommandError::EndOfInput)
    }

    /// Prompt until the answer parses.
    fn prompt_number<T: FromStr>(&mut self, prompt: &str) -> Result<T, CommandError> {
        loop {
            if let Ok(value) = self.prompt(prompt)?.parse() {
                return Ok(value);
            }
            writeln!(self.out, "Please enter a valid number.")?;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;

    use donation_desk_core::Ledger;

    use super::*;

    /// Feeds canned answers, then reports end of input.
    struct Script(VecDeque<String>);

    impl Script {
        fn new(lines: &[&str]) -> Self {
            Self(lines.iter().map(|line| (*line).to_owned()).collect())
        }
    }

    impl LineSource for Script {
        fn read_line(&mut self, _prompt: &str) -> Result<Option<String>, CommandError> {
            Ok(self.0.pop_front())
        }
    }

    fn demo_workspace() -> Workspace {
        Workspace::in_memory(Ledger::with_demo_data().unwrap())
    }

    fn run(workspace: &mut Workspace, lines: &[&str]) -> String {
        let mut shell = Shell::new(workspace, Script::new(lines), Vec::new());
        shell.run().unwrap();
        String::from_utf8(shell.into_output()).unwrap()
    }

    #[test]
    fn test_quit_from_main_menu() {
        let mut workspace = demo_workspace();
        let out = run(&mut workspace, &["0"]);
        assert!(out.contains("Goodbye."));
    }

    #[test]
    fn test_end_of_input_is_a_clean_exit() {
        let mut workspace = demo_workspace();
        let out = run(&mut workspace, &["1", "ong@apoio.org"]);
        assert!(out.contains("=== Donation Desk ==="));
        assert!(workspace.ledger().current_session().is_none());
    }

    #[test]
    fn test_bad_login_reports_and_returns_to_menu() {
        let mut workspace = demo_workspace();
        let out = run(&mut workspace, &["1", "ong@apoio.org", "wrong", "0"]);
        assert!(out.contains("invalid email or secret"));
        assert!(out.contains("Goodbye."));
    }

    #[test]
    fn test_institution_creates_request_with_reprompted_quantity() {
        let mut workspace = demo_workspace();
        let out = run(
            &mut workspace,
            &[
                "1", "ong@apoio.org", "123", // log in
                "1", "Flood relief", // new request
                "Water", "abc", "0", "12", "Drinks", // item with two bad quantities
                "", // done
                "0", "0",
            ],
        );
        assert!(out.contains("Please enter a valid number."));
        assert!(out.contains("Quantity must be positive."));
        assert!(out.contains("Request #3 created."));

        let request = workspace.ledger().get_request(RequestId::new(3)).unwrap();
        assert_eq!(request.justification, "Flood relief");
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].quantity.get(), 12);
        assert!(workspace.ledger().current_session().is_none());
    }

    #[test]
    fn test_request_without_items_is_refused() {
        let mut workspace = demo_workspace();
        let out = run(
            &mut workspace,
            &["1", "ong@apoio.org", "123", "1", "Nothing", "", "0", "0"],
        );
        assert!(out.contains("at least one item"));
        assert_eq!(workspace.ledger().requests().len(), 2);
    }

    #[test]
    fn test_donor_sees_only_approved_requests() {
        let mut workspace = demo_workspace();
        let out = run(
            &mut workspace,
            &["1", "carlos@doador.com", "123", "1", "1", "1", "2", "0", "0"],
        );
        // Request 1 is pending, so picking it is refused; request 2 is shown.
        assert!(out.contains("Request #1 not found."));
        assert!(out.contains("Request #2\n"));
        assert!(!out.contains("Rice 5kg"));
    }

    #[test]
    fn test_admin_rejects_with_reason() {
        let mut workspace = demo_workspace();
        let out = run(
            &mut workspace,
            &[
                "1", "admin@doacao.com", "123", // log in
                "1", "1", "2", "Out of scope", // reject request 1
                "0", "0",
            ],
        );
        assert!(out.contains("Pending: 1 | Approved: 1 | Rejected: 0 | Total: 2"));
        assert!(out.contains("Status updated."));

        let request = workspace.ledger().get_request(RequestId::new(1)).unwrap();
        assert_eq!(request.status, RequestStatus::Rejected);
        assert_eq!(request.rejection_reason.as_deref(), Some("Out of scope"));
    }

    #[test]
    fn test_admin_moves_request_back_to_pending() {
        let mut workspace = demo_workspace();
        run(
            &mut workspace,
            &["1", "admin@doacao.com", "123", "1", "2", "3", "0", "0"],
        );
        let request = workspace.ledger().get_request(RequestId::new(2)).unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[test]
    fn test_admin_deactivates_donor() {
        let mut workspace = demo_workspace();
        let out = run(
            &mut workspace,
            &[
                "1", "admin@doacao.com", "123", // log in
                "2", "3", // deactivate Carlos
                "2", "1", // try the admin account itself
                "2", "42", // unknown
                "0", // log out
                "1", "carlos@doador.com", "123", // locked out
                "0",
            ],
        );
        assert!(out.contains("carlos@doador.com"));
        assert!(out.contains("User #3 deactivated."));
        assert!(out.contains("cannot deactivate the logged-in account"));
        assert!(out.contains("User #42 not found."));
        assert!(out.contains("invalid email or secret"));

        let carlos = workspace.ledger().identity().find_by_email("carlos@doador.com").unwrap();
        assert!(!carlos.active);
        assert!(workspace.ledger().identity().find_by_email("admin@doacao.com").unwrap().active);
    }

    #[test]
    fn test_register_then_log_in_as_donor() {
        let mut workspace = demo_workspace();
        let out = run(
            &mut workspace,
            &[
                "2", "Ana", "ana@doador.com", "pw", "2", // register
                "1", "ana@doador.com", "pw", "0", // log in and out
                "0",
            ],
        );
        assert!(out.contains("Account created."));
        assert!(out.contains("Welcome, Ana!"));
        let user = workspace.ledger().identity().find_by_email("ana@doador.com").unwrap();
        assert_eq!(user.role, Role::Donor);
    }

    #[test]
    fn test_register_rejects_malformed_email_and_duplicates() {
        let mut workspace = demo_workspace();
        let out = run(
            &mut workspace,
            &[
                "2", "Bad", "not-an-email", // malformed
                "2", "Again", "ong@apoio.org", "x", "1", // duplicate
                "0",
            ],
        );
        assert!(out.contains("Invalid email"));
        assert!(out.contains("already registered"));
        assert_eq!(workspace.ledger().identity().len(), 3);
    }

    #[test]
    fn test_changes_are_saved_to_data_dir() {
        use crate::config::CliConfig;
        use donation_desk_core::storage::FlatFileStore;

        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            data_dir: Some(dir.path().to_path_buf()),
            demo_data: true,
        };
        let mut workspace = Workspace::open(&config).unwrap();
        run(
            &mut workspace,
            &["1", "admin@doacao.com", "123", "1", "1", "1", "0", "0"],
        );

        let reloaded = FlatFileStore::open(dir.path()).unwrap().load().unwrap();
        let request = reloaded.get_request(RequestId::new(1)).unwrap();
        assert_eq!(request.status, RequestStatus::Approved);
    }
}
