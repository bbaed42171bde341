use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use admit_documents::{DisplayDescriptor, SelectionStatus, SharedDocuments};
use admit_model::{Application, ApplicationStatus, BankAccount, DocumentEntry, format_timestamp};
use admit_store::EffectWarning;

pub fn print_application(application: &Application) {
    let mut table = Table::new();
    apply_table_style(&mut table);
    table.set_header(vec![header_cell("Field"), header_cell("Value")]);
    table.add_row(vec![Cell::new("Application"), Cell::new(&application.id)]);
    table.add_row(vec![Cell::new("Student"), Cell::new(&application.student_id)]);
    table.add_row(vec![Cell::new("Program"), Cell::new(&application.program_id)]);
    table.add_row(vec![Cell::new("Status"), status_cell(application.status)]);
    table.add_row(vec![
        Cell::new("Progress"),
        Cell::new(format!("{}%", application.progress())),
    ]);
    table.add_row(vec![
        Cell::new("Submitted"),
        optional_cell(application.submitted_at.map(format_timestamp)),
    ]);
    if let Some(due) = application.application_data.payment_due_date() {
        table.add_row(vec![Cell::new("Payment due"), Cell::new(format_timestamp(due))]);
    }
    if let Some(payment) = application.application_data.payment_status() {
        table.add_row(vec![Cell::new("Payment status"), Cell::new(payment)]);
    }
    if !application.missing_fields.is_empty() {
        table.add_row(vec![
            Cell::new("Missing"),
            Cell::new(application.missing_fields.join(", ")).fg(Color::Yellow),
        ]);
    }
    println!("{table}");
}

/// Documents shared with an application, labelled for display.
pub fn print_shared_documents(
    shared: &SharedDocuments,
    describe: impl Fn(&DocumentEntry) -> DisplayDescriptor,
    email: Option<&str>,
) {
    let mut table = Table::new();
    apply_table_style(&mut table);
    table.set_header(vec![
        header_cell("Document"),
        header_cell("Title"),
        header_cell("Original file"),
        header_cell("Verified"),
    ]);
    align_column(&mut table, 3, CellAlignment::Center);
    for entry in &shared.documents {
        let display = describe(entry);
        table.add_row(vec![
            dim_cell(entry.id()),
            title_cell(&display),
            optional_cell(display.original_file_name),
            verified_cell(entry.document.is_verified),
        ]);
    }
    println!("{table}");

    for id in &shared.missing_ids {
        println!("Shared document {id} no longer exists");
    }
    match email {
        Some(email) => println!("Student email: {email}"),
        None => println!("Student email: hidden until a payment receipt is shared"),
    }
}

/// The student's library with the current selection marked.
pub fn print_selection(
    documents: &[DocumentEntry],
    status: &SelectionStatus,
    describe: impl Fn(&DocumentEntry) -> DisplayDescriptor,
) {
    let mut table = Table::new();
    apply_table_style(&mut table);
    table.set_header(vec![
        header_cell("Shared"),
        header_cell("Document"),
        header_cell("Title"),
        header_cell("Original file"),
    ]);
    align_column(&mut table, 0, CellAlignment::Center);
    for entry in documents {
        let display = describe(entry);
        let shared = status.selected.contains(entry.id());
        table.add_row(vec![
            if shared {
                Cell::new("yes").fg(Color::Green)
            } else {
                dim_cell("-")
            },
            dim_cell(entry.id()),
            title_cell(&display),
            optional_cell(display.original_file_name),
        ]);
    }
    println!("{table}");
    print_save_status(status);
}

pub fn print_save_status(status: &SelectionStatus) {
    if let Some(error) = &status.save_error {
        println!("Not saved: {error} (run the command again to retry)");
    } else if let Some(at) = status.last_saved_at {
        println!("Saved at {}", format_timestamp(at));
    }
}

pub fn print_bank_accounts(accounts: Option<&[BankAccount]>) {
    let Some(accounts) = accounts else {
        println!("Bank details become available once the application is accepted.");
        return;
    };
    let mut table = Table::new();
    apply_table_style(&mut table);
    table.set_header(vec![
        header_cell("Bank"),
        header_cell("Account holder"),
        header_cell("IBAN"),
        header_cell("Currency"),
    ]);
    for account in accounts {
        table.add_row(vec![
            Cell::new(&account.bank_name),
            Cell::new(&account.account_holder),
            Cell::new(&account.iban),
            optional_cell(account.currency.clone()),
        ]);
    }
    println!("{table}");
}

pub fn print_warning(warning: &EffectWarning) {
    let notification = warning.notification();
    eprintln!("warning: {}: {}", notification.title, notification.description);
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn status_cell(status: ApplicationStatus) -> Cell {
    let color = match status {
        ApplicationStatus::Draft => Color::DarkGrey,
        ApplicationStatus::Submitted | ApplicationStatus::UnderReview => Color::Yellow,
        ApplicationStatus::Accepted => Color::Green,
        ApplicationStatus::Rejected => Color::Red,
    };
    Cell::new(status).fg(color).add_attribute(Attribute::Bold)
}

fn title_cell(display: &DisplayDescriptor) -> Cell {
    match &display.description {
        Some(description) => Cell::new(format!("{}\n{}", display.title, description)),
        None => Cell::new(&display.title),
    }
}

fn verified_cell(verified: bool) -> Cell {
    if verified {
        Cell::new("yes").fg(Color::Green)
    } else {
        dim_cell("no")
    }
}

fn optional_cell(value: Option<String>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
