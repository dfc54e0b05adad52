//! Kommandoraden

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::api::{GcgBackend, LocalBackend};
use crate::models::{
    AoiKind, AoiRecommendation, AoiTable, AoiTargetType, AoiUploadRequest, AppSettings, Aspect,
    ChecklistItem, OrgUnitKind, PenilaianRow, Role, UnitType, UploadRequest, User,
};
use crate::services::scoring;
use crate::services::{
    FileScanService, GcgHub, LegacyImportService, SessionStore, YearProgress,
};
use crate::utils::path::display_path;

#[derive(Parser, Debug)]
#[command(name = "gcg-hub", about = "GCG-dokument och bedömning per tahun buku", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Tahun buku (standard: senaste)
    #[arg(short, long, global = true)]
    pub year: Option<i32>,

    /// Mer loggning (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Bara fel loggas
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Skriv ut listor som JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Annan databasfil än i inställningarna
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Annan dokumentrot än i inställningarna
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Annan sessionsfil än i inställningarna
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,
}

impl Cli {
    /// Loggnivå från flaggorna, `None` betyder inställningsfilen
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.quiet {
            return Some(tracing::Level::ERROR);
        }
        match self.verbose {
            0 => None,
            1 => Some(tracing::Level::DEBUG),
            _ => Some(tracing::Level::TRACE),
        }
    }

    /// Inställningar med flaggornas överskrivningar
    pub fn settings(&self) -> AppSettings {
        let mut settings = AppSettings::load();
        if let Some(path) = &self.database {
            settings.database_path = path.clone();
        }
        if let Some(path) = &self.storage {
            settings.document_root = path.clone();
        }
        if let Some(path) = &self.session {
            settings.session_path = path.clone();
        }
        settings
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Räkenskapsår
    Years {
        #[command(subcommand)]
        action: YearAction,
    },
    /// Organisationsstruktur
    Structure {
        #[command(subcommand)]
        action: StructureAction,
    },
    /// Checklista och aspekter
    Checklist {
        #[command(subcommand)]
        action: ChecklistAction,
    },
    /// Tilldela ett checklistobjekt till en enhet
    Assign {
        checklist_id: i64,
        /// Enhetens namn
        unit: Option<String>,
        /// Enheten är ett subdirektorat
        #[arg(long)]
        subdirectorate: bool,
        /// Ta bort tilldelningen
        #[arg(long, conflicts_with = "unit")]
        clear: bool,
    },
    /// Ladda upp en fil
    Upload {
        path: PathBuf,
        #[arg(long)]
        checklist_id: Option<i64>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Uppladdade filer
    Files {
        #[command(subcommand)]
        action: FileAction,
    },
    /// Beräkna capaian och penjelasan för ett (bobot, skor)-par
    Score {
        #[arg(allow_negative_numbers = true)]
        weight: f64,
        #[arg(allow_negative_numbers = true)]
        score: f64,
    },
    /// Bedömningsbladet
    Assessment {
        #[command(subcommand)]
        action: AssessmentAction,
    },
    /// Uppladdningsframsteg per aspekt och enhet
    Progress,
    /// Stäm av dokumentkatalogen mot databasen
    Scan,
    /// Importera en JSON-export av gammal webbläsarlagring
    ImportLegacy {
        path: PathBuf,
        /// Visa bara vad exporten innehåller
        #[arg(long)]
        preview: bool,
        /// Importera även om en import redan gjorts
        #[arg(long)]
        force: bool,
    },
    /// Logga in och spara sessionen
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Visa inloggad användare
    Whoami,
    /// Användarkonton
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Area of Improvement
    Aoi {
        #[command(subcommand)]
        action: AoiAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    List,
    Add {
        email: String,
        name: String,
        /// superadmin, admin eller user
        #[arg(long, default_value = "user")]
        role: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Byt lösenord
    Passwd { email: String, password: String },
}

#[derive(Subcommand, Debug)]
pub enum AoiAction {
    Tables,
    /// Ny tabell. Målet är den mest specifika enheten som anges.
    AddTable {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        direktorat: Option<String>,
        #[arg(long)]
        subdirektorat: Option<String>,
        #[arg(long)]
        divisi: Option<String>,
    },
    DeleteTable { id: i64 },
    /// Rekommendationer och uppföljning för en tabell
    Show { table_id: i64 },
    AddRecommendation {
        table_id: i64,
        text: String,
        /// Raden är ett råd (SARAN)
        #[arg(long)]
        saran: bool,
        /// 1-5
        #[arg(long, default_value_t = 1)]
        urgency: u8,
        #[arg(long)]
        timeframe: Option<String>,
        #[arg(long)]
        party: Option<String>,
    },
    DeleteRecommendation { id: i64 },
    /// Markera organ som har följt upp, t.ex. `--done rups,direksi`
    Track {
        recommendation_id: i64,
        #[arg(long, value_delimiter = ',')]
        done: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        undone: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Ladda upp bevis för en rekommendation
    Upload { recommendation_id: i64, path: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum YearAction {
    List,
    Add {
        fiscal_year: i32,
        /// Skapa standardstrukturen för året
        #[arg(long)]
        seed: bool,
    },
    Remove { fiscal_year: i32 },
    /// Ta bort årets filer och dokument
    ClearDocuments { fiscal_year: i32 },
    /// Ta bort all data för året men behåll året
    BulkDelete { fiscal_year: i32 },
}

#[derive(Subcommand, Debug)]
pub enum StructureAction {
    List,
    /// Skapa standardstrukturen
    Seed,
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ChecklistAction {
    List {
        #[arg(long)]
        aspect: Option<String>,
        /// Bara objekt utan ansvarig enhet
        #[arg(long)]
        unassigned: bool,
    },
    Add {
        #[arg(long)]
        aspect: String,
        #[arg(long)]
        description: String,
    },
    Delete { id: i64 },
    Aspects,
    AddAspect { name: String },
    RenameAspect { id: i64, name: String },
    DeleteAspect { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum FileAction {
    List,
    Stats,
    Delete { id: String },
    /// Ta bort alla filer med ett visst namn
    DeleteNamed { file_name: String },
}

#[derive(Subcommand, Debug)]
pub enum AssessmentAction {
    Show,
    /// Ersätt årets bedömning med rader från en JSON-fil
    Import {
        path: PathBuf,
        #[arg(long)]
        assessor: Option<String>,
    },
}

/// Rad i en JSON-fil för `assessment import`
#[derive(Debug, Deserialize)]
struct RowInput {
    #[serde(rename = "aspek")]
    aspect: String,
    #[serde(rename = "deskripsi", default)]
    description: String,
    #[serde(rename = "bobot")]
    weight: f64,
    #[serde(rename = "skor")]
    score: f64,
    #[serde(rename = "penjelasanManual")]
    classification_override: Option<String>,
}

pub fn run(cli: Cli) -> Result<()> {
    if let Command::Score { weight, score } = &cli.command {
        print_score(*weight, *score);
        return Ok(());
    }

    let settings = cli.settings();
    let backend = Arc::new(LocalBackend::open(&settings)?);
    let mut hub = GcgHub::new(backend.clone());
    hub.load()?;
    if let Some(year) = cli.year {
        if hub.years().contains(year) {
            hub.select_year(year)?;
        }
    }

    let json = cli.json;
    match cli.command {
        Command::Score { .. } => Ok(()),
        Command::Years { action } => run_years(&mut hub, &settings, action),
        Command::Structure { action } => {
            let year = resolve_year(&hub, cli.year)?;
            run_structure(&mut hub, year, json, action)
        }
        Command::Checklist { action } => {
            let year = resolve_year(&hub, cli.year)?;
            run_checklist(&mut hub, year, json, action)
        }
        Command::Assign {
            checklist_id,
            unit,
            subdirectorate,
            clear,
        } => {
            if clear {
                let year = resolve_year(&hub, cli.year)?;
                hub.unassign(checklist_id, year)?;
                println!("Tilldelning för {} borttagen", checklist_id);
                return Ok(());
            }
            let Some(unit) = unit else {
                bail!("Ange en enhet eller --clear");
            };
            let unit_type = if subdirectorate {
                UnitType::Subdirectorate
            } else {
                UnitType::Division
            };
            let assignment = hub.assign(checklist_id, &unit, unit_type)?;
            println!("{} -> {} ({})", checklist_id, assignment.unit_name, assignment.unit_type);
            Ok(())
        }
        Command::Upload {
            path,
            checklist_id,
            unit,
            note,
        } => {
            let year = resolve_year(&hub, cli.year)?;
            run_upload(&mut hub, year, &path, checklist_id, unit, note)
        }
        Command::Files { action } => {
            let year = resolve_year(&hub, cli.year)?;
            run_files(&mut hub, year, json, action)
        }
        Command::Assessment { action } => run_assessment(&mut hub, &settings, json, action),
        Command::Progress => {
            let progress = hub.progress(resolve_year(&hub, cli.year)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else {
                print_progress(&progress);
            }
            Ok(())
        }
        Command::Scan => {
            let scanner = FileScanService::new(backend.database(), backend.documents_dir());
            let result = scanner.scan()?;
            println!("{}", result.summary());
            for warning in &result.warnings {
                println!("  varning: {}", warning);
            }
            Ok(())
        }
        Command::ImportLegacy {
            path,
            preview,
            force,
        } => run_import(backend.as_ref(), &settings, &path, preview, force),
        Command::Login { email, password } => {
            let login = backend.login(&email, &password)?;
            let mut session = SessionStore::open(&settings.session_path);
            session.set_user(&login.user)?;
            session.set_token(&login.token)?;
            println!("Inloggad som {} ({})", login.user.name, login.user.role);
            Ok(())
        }
        Command::Logout => {
            SessionStore::open(&settings.session_path).clear_session()?;
            println!("Utloggad");
            Ok(())
        }
        Command::Whoami => {
            match SessionStore::open(&settings.session_path).user() {
                Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
                None => println!("Inte inloggad"),
            }
            Ok(())
        }
        Command::Users { action } => run_users(backend.as_ref(), json, action),
        Command::Aoi { action } => {
            let year = resolve_year(&hub, cli.year)?;
            let author = SessionStore::open(&settings.session_path)
                .user()
                .map(|u| u.email)
                .unwrap_or_default();
            run_aoi(&mut hub, year, &author, json, action)
        }
    }
}

/// Året som kommandot gäller
fn resolve_year(hub: &GcgHub, requested: Option<i32>) -> Result<i32> {
    match requested {
        Some(year) if hub.years().contains(year) => Ok(year),
        Some(year) => bail!("Tahun buku {} finns inte", year),
        None => hub
            .selected_year()
            .context("Inga tahun buku finns; skapa ett med `years add`"),
    }
}

fn print_score(weight: f64, score: f64) {
    let classification = scoring::classify(weight, score);
    println!(
        "capaian {}%  penjelasan {} ({})",
        scoring::achievement(weight, score),
        classification.display_name(),
        classification.label()
    );
}

fn run_years(hub: &mut GcgHub, settings: &AppSettings, action: YearAction) -> Result<()> {
    match action {
        YearAction::List => {
            for year in hub.years().years() {
                let marker = if Some(year.year) == hub.selected_year() { "*" } else { " " };
                println!("{} {}", marker, year.year);
            }
        }
        YearAction::Add { fiscal_year: year, seed } => {
            hub.add_year(year, seed || settings.seed_structure_on_new_year)?;
            println!("Tahun buku {} skapat", year);
        }
        YearAction::Remove { fiscal_year: year } => {
            let removal = hub.remove_year(year)?;
            match (&removal.cleanup_stats, &removal.backend_error) {
                (Some(stats), _) => println!("Tahun buku {} borttaget: {}", year, stats.summary()),
                (None, Some(e)) => println!("Tahun buku {} borttaget lokalt, backendfel: {}", year, e),
                (None, None) => println!("Tahun buku {} borttaget", year),
            }
        }
        YearAction::ClearDocuments { fiscal_year: year } => {
            let stats = hub.clear_year_documents(year)?;
            println!("{}", stats.summary());
        }
        YearAction::BulkDelete { fiscal_year: year } => {
            let stats = hub.bulk_delete(year)?;
            println!("{}", stats.summary());
        }
    }
    Ok(())
}

fn run_structure(hub: &mut GcgHub, year: i32, json: bool, action: StructureAction) -> Result<()> {
    match action {
        StructureAction::List => {
            if json {
                println!("{}", serde_json::to_string_pretty(&hub.structure().units_for_year(year))?);
                return Ok(());
            }
            for directorate in hub.structure().by_kind(OrgUnitKind::Directorate, year) {
                print_unit_tree(hub, directorate.id, &directorate.name, 0);
            }
            for subsidiary in hub.structure().by_kind(OrgUnitKind::Subsidiary, year) {
                println!("{} [{}]", subsidiary.name, subsidiary.kind.display_name());
            }
        }
        StructureAction::Seed => {
            let created = hub.structure_mut().seed_default(year)?;
            println!("{} enheter skapade", created);
        }
        StructureAction::Delete { id } => {
            hub.delete_unit(id)?;
            println!("Enhet {} borttagen", id);
        }
    }
    Ok(())
}

fn print_unit_tree(hub: &GcgHub, id: Option<i64>, name: &str, depth: usize) {
    println!("{}{} ({})", "  ".repeat(depth), name, id.unwrap_or_default());
    let Some(id) = id else { return };
    for child in hub.structure().children(id) {
        print_unit_tree(hub, child.id, &child.name, depth + 1);
    }
}

fn run_checklist(hub: &mut GcgHub, year: i32, json: bool, action: ChecklistAction) -> Result<()> {
    match action {
        ChecklistAction::List { aspect, unassigned } => {
            let items: Vec<&ChecklistItem> = match (&aspect, unassigned) {
                (_, true) => hub.checklist().unassigned(year),
                (Some(aspect), false) => hub.checklist().by_aspect(year, aspect),
                (None, false) => hub.checklist().items(year),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
                return Ok(());
            }
            for item in items {
                println!(
                    "{:>4} {:>5}  {:<24} {}  [{}]",
                    item.row_number,
                    item.id.unwrap_or_default(),
                    item.aspect,
                    item.description,
                    item.assigned_unit.as_deref().unwrap_or("-")
                );
            }
        }
        ChecklistAction::Add { aspect, description } => {
            let item = hub.create_checklist_item(&ChecklistItem::new(aspect, description, year))?;
            println!("Checklistobjekt {} skapat", item.id.unwrap_or_default());
        }
        ChecklistAction::Delete { id } => {
            hub.delete_checklist_item(id)?;
            println!("Checklistobjekt {} borttaget", id);
        }
        ChecklistAction::Aspects => {
            let aspects: Vec<&Aspect> = hub.checklist().aspects(year);
            if json {
                println!("{}", serde_json::to_string_pretty(&aspects)?);
                return Ok(());
            }
            for aspect in aspects {
                println!("{:>4}  {}", aspect.id.unwrap_or_default(), aspect.name);
            }
        }
        ChecklistAction::AddAspect { name } => {
            let aspect = hub.checklist_mut().add_aspect(&name, year)?;
            println!("Aspekt {} skapad", aspect.name);
        }
        ChecklistAction::RenameAspect { id, name } => {
            let aspect = hub.checklist_mut().rename_aspect(id, &name)?;
            println!("Aspekt {} heter nu {}", id, aspect.name);
        }
        ChecklistAction::DeleteAspect { id } => {
            hub.checklist_mut().delete_aspect(id)?;
            println!("Aspekt {} borttagen", id);
        }
    }
    Ok(())
}

fn run_upload(
    hub: &mut GcgHub,
    year: i32,
    path: &Path,
    checklist_id: Option<i64>,
    unit: Option<String>,
    note: Option<String>,
) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("Kunde inte läsa {}", display_path(path)))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .context("Sökvägen saknar filnamn")?;

    let mut request = UploadRequest::new(file_name, bytes, year);
    request.checklist_id = checklist_id;
    request.note = note;
    request.unit = unit;

    if let Some(item) = checklist_id.and_then(|id| hub.checklist().find(id)) {
        request.checklist_description = Some(item.description.clone());
        request.aspect = Some(item.aspect.clone());
        request.row_number = Some(item.row_number);
        if request.unit.is_none() {
            request.unit = item.assigned_unit.clone();
        }
    }

    let file = hub.upload(&request)?;
    println!("{} uppladdad ({}), id {}", file.file_name, file.file_size_display(), file.id);
    Ok(())
}

fn run_files(hub: &mut GcgHub, year: i32, json: bool, action: FileAction) -> Result<()> {
    match action {
        FileAction::List => {
            let files = hub.files().files_for_year(year);
            if json {
                println!("{}", serde_json::to_string_pretty(&files)?);
                return Ok(());
            }
            for file in files {
                println!(
                    "{}  {:<32} {:>10}  {:<8} {}",
                    file.id,
                    file.file_name,
                    file.file_size_display(),
                    file.status,
                    file.aspect.as_deref().unwrap_or("-")
                );
            }
        }
        FileAction::Stats => {
            let stats = hub.files().stats(year);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "{} filer, {} byte, {} uppladdade, {} väntande",
                    stats.total_files, stats.total_size, stats.uploaded_count, stats.pending_count
                );
            }
        }
        FileAction::Delete { id } => {
            hub.delete_file(&id)?;
            println!("Fil {} borttagen", id);
        }
        FileAction::DeleteNamed { file_name } => {
            let ids: Vec<String> = hub
                .files()
                .files_for_year(year)
                .iter()
                .filter(|f| f.file_name == file_name)
                .map(|f| f.id.clone())
                .collect();
            if ids.is_empty() {
                bail!("Ingen fil med namnet {} för {}", file_name, year);
            }
            for id in &ids {
                hub.delete_file(id)?;
            }
            println!("{} fil(er) borttagna", ids.len());
        }
    }
    Ok(())
}

fn run_assessment(hub: &mut GcgHub, settings: &AppSettings, json: bool, action: AssessmentAction) -> Result<()> {
    match action {
        AssessmentAction::Show => {
            let sheet = hub.open_assessment(&settings.default_assessor)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sheet.submission())?);
                return Ok(());
            }
            for row in sheet.rows() {
                println!(
                    "{:>3} {:<20} {:<40} {:>7.2} {:>7.2} {:>5}%  {}",
                    row.no,
                    row.aspect,
                    row.description,
                    row.weight(),
                    row.score(),
                    row.achievement(),
                    row.display_classification()
                );
            }
            println!();
            let mut summaries = sheet.aspect_summaries();
            summaries.push(sheet.overall());
            for summary in &summaries {
                println!(
                    "{:<24} {:>3} st {:>8.2} {:>8.2} {:>5}%  {}",
                    summary.aspect,
                    summary.indicator_count,
                    summary.total_weight,
                    summary.total_score,
                    summary.achievement,
                    summary.classification.display_name()
                );
            }
        }
        AssessmentAction::Import { path, assessor } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Kunde inte läsa {}", display_path(&path)))?;
            let rows: Vec<RowInput> = serde_json::from_str(&content).context("Ogiltiga bedömningsrader")?;

            let assessor = assessor.unwrap_or_else(|| settings.default_assessor.clone());
            let sheet = hub.open_assessment(&assessor)?;
            while !sheet.is_empty() {
                sheet.remove_row(1)?;
            }
            for input in rows {
                let mut row = PenilaianRow::new(input.aspect, input.description, input.weight, input.score);
                if let Some(text) = input.classification_override {
                    row.override_classification(text);
                }
                sheet.add_row(row);
            }

            let saved = hub.save_assessment()?;
            println!("{} rader sparade", saved);
        }
    }
    Ok(())
}

fn run_users(backend: &LocalBackend, json: bool, action: UserAction) -> Result<()> {
    match action {
        UserAction::List => {
            let users = backend.list_users()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
                return Ok(());
            }
            for user in users {
                let status = if user.is_active { "" } else { "  (inaktiv)" };
                println!("{:<32} {:<24} {}{}", user.email, user.name, user.role, status);
            }
        }
        UserAction::Add {
            email,
            name,
            role,
            password,
        } => {
            let user = backend.create_user(&User::new(email, name, Role::from_db_str(&role)))?;
            let id = user.id.context("Användaren fick inget id")?;
            if let Some(password) = password {
                backend.set_password(id, &password)?;
            }
            println!("Användare {} skapad ({})", user.email, user.role);
        }
        UserAction::Passwd { email, password } => {
            let user = backend
                .list_users()?
                .into_iter()
                .find(|u| u.email.eq_ignore_ascii_case(&email))
                .with_context(|| format!("Ingen användare {}", email))?;
            backend.set_password(user.id.context("Användaren saknar id")?, &password)?;
            println!("Lösenord bytt för {}", user.email);
        }
    }
    Ok(())
}

fn run_aoi(hub: &mut GcgHub, year: i32, author: &str, json: bool, action: AoiAction) -> Result<()> {
    match action {
        AoiAction::Tables => {
            let tables = hub.aoi().tables(year);
            if json {
                println!("{}", serde_json::to_string_pretty(&tables)?);
                return Ok(());
            }
            for table in tables {
                println!(
                    "{:>4}  {:<32} {:<14} {}",
                    table.id.unwrap_or_default(),
                    table.name,
                    table.target_type.as_str(),
                    table.target_name().unwrap_or("-")
                );
            }
            let (complete, total) = hub.aoi().completion(year);
            println!("{}/{} rekommendationer helt uppföljda", complete, total);
        }
        AoiAction::AddTable {
            name,
            description,
            direktorat,
            subdirektorat,
            divisi,
        } => {
            let target_type = if divisi.is_some() {
                AoiTargetType::Divisi
            } else if subdirektorat.is_some() {
                AoiTargetType::Subdirektorat
            } else {
                AoiTargetType::Direktorat
            };
            let mut table = AoiTable::new(name, year, target_type);
            table.description = description.unwrap_or_default();
            table.target_direktorat = direktorat;
            table.target_subdirektorat = subdirektorat;
            table.target_divisi = divisi;
            table.created_by = author.to_string();

            let created = hub.create_aoi_table(&table)?;
            println!("AOI-tabell {} skapad", created.id.unwrap_or_default());
        }
        AoiAction::DeleteTable { id } => {
            hub.delete_aoi_table(id)?;
            println!("AOI-tabell {} borttagen", id);
        }
        AoiAction::Show { table_id } => {
            let recs = hub.aoi().recommendations(table_id);
            if json {
                println!("{}", serde_json::to_string_pretty(&recs)?);
                return Ok(());
            }
            for rec in recs {
                let id = rec.id.unwrap_or_default();
                let tracked = hub
                    .aoi()
                    .tracking_for(id)
                    .map(|t| t.completed_count())
                    .unwrap_or_default();
                let evidence = if hub.aoi().documents_for(id).is_empty() { "" } else { "  [bevis]" };
                println!(
                    "{:>3} {:<12} {:<48} {:<5} {}/6{}",
                    rec.no,
                    rec.kind.as_str(),
                    rec.text(),
                    "*".repeat(rec.urgency as usize),
                    tracked,
                    evidence
                );
            }
        }
        AoiAction::AddRecommendation {
            table_id,
            text,
            saran,
            urgency,
            timeframe,
            party,
        } => {
            let kind = if saran { AoiKind::Saran } else { AoiKind::Rekomendasi };
            let mut rec = AoiRecommendation::new(table_id, kind, text, year);
            rec.urgency = urgency;
            rec.timeframe = timeframe.unwrap_or_default();
            rec.related_party = party.unwrap_or_default();
            rec.created_by = author.to_string();

            let created = hub.create_aoi_recommendation(&rec)?;
            println!("{} nr {} skapad, id {}", created.kind, created.no, created.id.unwrap_or_default());
        }
        AoiAction::DeleteRecommendation { id } => {
            hub.aoi_mut().delete_recommendation(id)?;
            println!("Rekommendation {} borttagen", id);
        }
        AoiAction::Track {
            recommendation_id,
            done,
            undone,
            notes,
        } => {
            let mut tracking = hub
                .aoi()
                .tracking_for(recommendation_id)
                .cloned()
                .with_context(|| format!("Ingen uppföljning för rekommendation {}", recommendation_id))?;
            for key in &done {
                tracking.set_party(key, true).map_err(anyhow::Error::msg)?;
            }
            for key in &undone {
                tracking.set_party(key, false).map_err(anyhow::Error::msg)?;
            }
            if notes.is_some() {
                tracking.notes = notes;
            }
            tracking.updated_by = author.to_string();

            let updated = hub.update_aoi_tracking(&tracking)?;
            println!("{}/6 organ har följt upp", updated.completed_count());
        }
        AoiAction::Upload { recommendation_id, path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Kunde inte läsa {}", display_path(&path)))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .context("Sökvägen saknar filnamn")?;

            let mut request = AoiUploadRequest::new(file_name, bytes, recommendation_id);
            request.user_id = author.to_string();
            let doc = hub.upload_aoi_document(&request)?;
            println!("{} uppladdad för {} nr {}", doc.file_name, doc.kind, doc.no);
        }
    }
    Ok(())
}

fn print_progress(progress: &YearProgress) {
    let overall = &progress.overall;
    println!(
        "Tahun buku {}: {}/{} uppladdade ({}%)",
        progress.year, overall.uploaded_count, overall.total_items, overall.percentage
    );
    println!();
    for aspect in &progress.aspects {
        println!(
            "  {:<32} {:>3}/{:<3} {:>3}%",
            aspect.aspect, aspect.progress.uploaded_count, aspect.progress.total_items, aspect.progress.percentage
        );
    }
    if !progress.units.is_empty() {
        println!();
        for unit in &progress.units {
            println!(
                "  {:<32} {:>3}/{:<3} {:>3}%",
                unit.unit, unit.progress.uploaded_count, unit.progress.total_items, unit.progress.percentage
            );
        }
    }
}

fn run_import(
    backend: &LocalBackend,
    settings: &AppSettings,
    path: &Path,
    preview: bool,
    force: bool,
) -> Result<()> {
    if preview {
        let data = LegacyImportService::read_export(path)?;
        let preview = LegacyImportService::preview(&data);
        for (key, count) in &preview.counts {
            println!("{:<24} {}", key, count);
        }
        if !preview.unknown_keys.is_empty() {
            println!("Okända nycklar: {}", preview.unknown_keys.join(", "));
        }
        return Ok(());
    }

    let service = LegacyImportService::new(backend.database());
    let mut session = SessionStore::open(&settings.session_path);

    let result = if force {
        let data = LegacyImportService::read_export(path)?;
        let result = service.import(&data)?;
        session.mark_migrated()?;
        Some(result)
    } else {
        service.import_once(path, &mut session)?
    };

    match result {
        Some(result) => {
            println!("{}", result.summary());
            for warning in &result.warnings {
                println!("  varning: {}", warning);
            }
        }
        None => println!("Redan importerad (använd --force för att importera igen)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gcg-hub", "progress", "--year", "2024", "-vv"]).unwrap();
        assert_eq!(cli.year, Some(2024));
        assert_eq!(cli.log_level(), Some(tracing::Level::TRACE));
        assert!(matches!(cli.command, Command::Progress));
    }

    #[test]
    fn test_parse_negative_weight() {
        let cli = Cli::try_parse_from(["gcg-hub", "score", "-10", "5"]).unwrap();
        match cli.command {
            Command::Score { weight, score } => {
                assert_eq!(weight, -10.0);
                assert_eq!(score, 5.0);
            }
            other => panic!("fel kommando: {:?}", other),
        }
    }

    #[test]
    fn test_assign_requires_unit_or_clear() {
        assert!(Cli::try_parse_from(["gcg-hub", "assign", "5", "Divisi A", "--clear"]).is_err());
        let cli = Cli::try_parse_from(["gcg-hub", "assign", "5", "--clear"]).unwrap();
        assert!(matches!(cli.command, Command::Assign { clear: true, .. }));
    }

    fn run_in(dir: &Path, args: &[&str]) -> Result<()> {
        let database = dir.join("gcg.db");
        let storage = dir.join("lagring");
        let session = dir.join("session.json");
        let mut argv = vec![
            "gcg-hub".to_string(),
            "--database".to_string(),
            database.to_string_lossy().to_string(),
            "--storage".to_string(),
            storage.to_string_lossy().to_string(),
            "--session".to_string(),
            session.to_string_lossy().to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));
        run(Cli::try_parse_from(argv)?)
    }

    #[test]
    fn test_run_against_database_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        run_in(root, &["years", "add", "2024", "--seed"]).unwrap();
        run_in(root, &["checklist", "add", "--aspect", "Direksi", "--description", "Pedoman Direksi"]).unwrap();

        let document = root.join("pedoman.pdf");
        std::fs::write(&document, b"pdf").unwrap();
        run_in(root, &["upload", document.to_str().unwrap(), "--unit", "Divisi Treasury"]).unwrap();
        run_in(root, &["--json", "progress"]).unwrap();
        run_in(root, &["scan"]).unwrap();

        let db = crate::db::Database::open(&root.join("gcg.db")).unwrap();
        assert_eq!(db.checklists().find_by_year(2024).unwrap().len(), 1);
        assert_eq!(db.files().find_all(Some(2024)).unwrap().len(), 1);
        assert!(root.join("lagring").join("gcg-documents").join("2024").is_dir());

        assert!(run_in(root, &["--year", "1999", "progress"]).is_err());
        run_in(root, &["years", "remove", "2024"]).unwrap();
        assert!(run_in(root, &["progress"]).is_err());
    }

    #[test]
    fn test_year_argument_and_global_year_flag() {
        let cli = Cli::try_parse_from(["gcg-hub", "--year", "2023", "years", "remove", "2024"]).unwrap();
        assert_eq!(cli.year, Some(2023));
        match cli.command {
            Command::Years {
                action: YearAction::Remove { fiscal_year },
            } => assert_eq!(fiscal_year, 2024),
            other => panic!("fel kommando: {:?}", other),
        }
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let cli = Cli::try_parse_from(["gcg-hub", "-q", "-v", "scan"]).unwrap();
        assert_eq!(cli.log_level(), Some(tracing::Level::ERROR));
    }

    #[test]
    fn test_parse_aoi_track_list() {
        let cli = Cli::try_parse_from(["gcg-hub", "aoi", "track", "7", "--done", "rups,direksi"]).unwrap();
        match cli.command {
            Command::Aoi {
                action: AoiAction::Track { recommendation_id, done, .. },
            } => {
                assert_eq!(recommendation_id, 7);
                assert_eq!(done, vec!["rups", "direksi"]);
            }
            other => panic!("fel kommando: {:?}", other),
        }
    }

    #[test]
    fn test_login_writes_session() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        run_in(root, &["users", "add", "admin@gcg.co.id", "Admin GCG", "--role", "admin", "--password", "rahasia123"]).unwrap();
        assert!(run_in(root, &["login", "--email", "admin@gcg.co.id", "--password", "salah123"]).is_err());
        let session = SessionStore::open(root.join("session.json"));
        assert!(session.token().is_none());

        run_in(root, &["login", "--email", "admin@gcg.co.id", "--password", "rahasia123"]).unwrap();
        let session = SessionStore::open(root.join("session.json"));
        assert_eq!(session.user().unwrap().role, Role::Admin);
        assert!(session.token().is_some());

        run_in(root, &["users", "passwd", "admin@gcg.co.id", "baru12345"]).unwrap();
        assert!(run_in(root, &["login", "--email", "admin@gcg.co.id", "--password", "rahasia123"]).is_err());

        run_in(root, &["logout"]).unwrap();
        let session = SessionStore::open(root.join("session.json"));
        assert!(session.user().is_none());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_aoi_commands() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        run_in(root, &["years", "add", "2024"]).unwrap();
        run_in(root, &["aoi", "add-table", "AOI Direksi", "--direktorat", "Direktorat Utama"]).unwrap();
        run_in(root, &["aoi", "add-recommendation", "1", "Perbarui pedoman", "--urgency", "4"]).unwrap();
        run_in(root, &["aoi", "track", "1", "--done", "rups,komite"]).unwrap();
        assert!(run_in(root, &["aoi", "track", "1", "--done", "auditor"]).is_err());
        assert!(run_in(root, &["aoi", "add-recommendation", "1", "X", "--urgency", "9"]).is_err());

        let evidence = root.join("bukti.pdf");
        std::fs::write(&evidence, b"pdf").unwrap();
        run_in(root, &["aoi", "upload", "1", evidence.to_str().unwrap()]).unwrap();
        run_in(root, &["aoi", "show", "1"]).unwrap();

        let db = crate::db::Database::open(&root.join("gcg.db")).unwrap();
        let tracking = db.aoi().find_tracking_for(1).unwrap().unwrap();
        assert_eq!(tracking.completed_count(), 2);
        assert_eq!(db.aoi().find_documents(Some(2024)).unwrap().len(), 1);

        run_in(root, &["aoi", "delete-table", "1"]).unwrap();
        assert!(db.aoi().find_recommendations(Some(2024), None).unwrap().is_empty());
    }
}
