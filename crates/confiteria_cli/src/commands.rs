use std::path::PathBuf;

use clap::{Args, Subcommand};
use confiteria_core::{
    format_relative, format_timestamp, CategoryCatalog, Product, ProductId, ProductListQuery,
    ProductPage, ProductRepository, ProductService, RawProductInput, ServiceError,
};
use rust_decimal::Decimal;

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Register a new product
    Add(ProductArgs),
    /// Replace every field of an existing product
    Update(UpdateArgs),
    /// Show one product in detail
    Show(IdArgs),
    /// List products with optional filters
    List(ListArgs),
    /// Delete one product
    Delete(IdArgs),
    /// Delete every product
    Clear(ClearArgs),
    /// Export all products as CSV
    Export(ExportArgs),
    /// Print the category catalog
    Categories,
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Update(_) => "update",
            Self::Show(_) => "show",
            Self::List(_) => "list",
            Self::Delete(_) => "delete",
            Self::Clear(_) => "clear",
            Self::Export(_) => "export",
            Self::Categories => "categories",
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct ProductArgs {
    /// Product name, up to 20 characters
    #[arg(long)]
    name: Option<String>,

    /// Price in soles, strictly between 0 and 999
    #[arg(long, allow_hyphen_values = true)]
    price: Option<String>,

    /// Catalog label; repeat for several categories
    #[arg(long = "category")]
    categories: Vec<String>,

    /// On-sale label (Si|No by default)
    #[arg(long)]
    on_sale: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct UpdateArgs {
    /// Product id
    id: ProductId,

    #[command(flatten)]
    product: ProductArgs,
}

#[derive(Debug, Args)]
pub(crate) struct IdArgs {
    /// Product id
    id: ProductId,
}

#[derive(Debug, Args)]
pub(crate) struct ListArgs {
    /// Case-insensitive name substring
    #[arg(long)]
    search: Option<String>,

    /// Only products carrying this catalog label
    #[arg(long)]
    category: Option<String>,

    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Products per page, 1 to 100
    #[arg(long, default_value_t = 10)]
    per_page: u32,
}

#[derive(Debug, Args)]
pub(crate) struct ClearArgs {
    /// Confirm deletion of every product
    #[arg(long)]
    yes: bool,
}

#[derive(Debug, Args)]
pub(crate) struct ExportArgs {
    /// Output file; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run<R: ProductRepository>(
    command: Command,
    service: ProductService<R>,
) -> Result<(), String> {
    match command {
        Command::Add(args) => add(&service, args),
        Command::Update(args) => update(&service, args),
        Command::Show(args) => show(&service, args.id),
        Command::List(args) => list(&service, args),
        Command::Delete(args) => delete(&service, args.id),
        Command::Clear(args) => clear(&service, args),
        Command::Export(args) => export(&service, args),
        Command::Categories => print_categories(service.catalog()),
    }
}

pub(crate) fn print_categories(catalog: &CategoryCatalog) -> Result<(), String> {
    for label in catalog.labels() {
        println!("{label}");
    }
    Ok(())
}

fn add<R: ProductRepository>(service: &ProductService<R>, args: ProductArgs) -> Result<(), String> {
    let input = raw_input(args, service.tokens().yes());
    let product = service.create_product(&input).map_err(describe)?;

    println!("✅ Producto guardado correctamente");
    println!("id: {}", product.id);
    Ok(())
}

fn update<R: ProductRepository>(
    service: &ProductService<R>,
    args: UpdateArgs,
) -> Result<(), String> {
    // An omitted --on-sale keeps the stored flag.
    let stored_on_sale = match args.product.on_sale {
        Some(_) => None,
        None => Some(stored_on_sale_label(service, args.id)?),
    };
    let input = raw_input(args.product, stored_on_sale.as_deref().unwrap_or_default());
    service
        .update_product(args.id, &input)
        .map_err(describe)?;

    println!("✅ Producto actualizado correctamente");
    Ok(())
}

fn show<R: ProductRepository>(service: &ProductService<R>, id: ProductId) -> Result<(), String> {
    let product = service
        .get_product(id)
        .map_err(describe)?
        .ok_or_else(|| describe(ServiceError::NotFound(id)))?;

    println!("{}", headline(&product));
    println!("ID: {}", product.id);
    println!("Categorías: {}", product.categories.join(", "));
    println!("En venta: {}", service.tokens().label(product.on_sale));
    println!("Fecha registro: {}", format_timestamp(product.created_at));
    println!(
        "Última modificación: {} ({})",
        format_timestamp(product.updated_at),
        format_relative(product.updated_at, service.now())
    );
    Ok(())
}

fn list<R: ProductRepository>(service: &ProductService<R>, args: ListArgs) -> Result<(), String> {
    let query = ProductListQuery {
        name_contains: args.search,
        category: args.category,
        page: args.page,
        per_page: args.per_page,
    };
    let page = service.list_products(&query).map_err(describe)?;

    if page.total_items == 0 {
        println!("{}", empty_list_notice(&query));
        return Ok(());
    }

    let now = service.now();
    for product in &page.items {
        println!("{}", headline(product));
        println!("   id: {}", product.id);
        println!("   categorías: {}", product.categories.join(", "));
        println!("   en venta: {}", service.tokens().label(product.on_sale));
        println!("   modificado {}", format_relative(product.updated_at, now));
    }
    println!("{}", page_footer(&page));
    Ok(())
}

fn empty_list_notice(query: &ProductListQuery) -> &'static str {
    let searching = query
        .name_contains
        .as_deref()
        .is_some_and(|needle| !needle.trim().is_empty());
    if searching || query.category.is_some() {
        "⚠️ Ningún producto coincide con los filtros."
    } else {
        "⚠️ No hay productos registrados todavía."
    }
}

fn page_footer(page: &ProductPage) -> String {
    format!(
        "Página {} de {} ({} productos)",
        page.page, page.total_pages, page.total_items
    )
}

fn delete<R: ProductRepository>(service: &ProductService<R>, id: ProductId) -> Result<(), String> {
    service.delete_product(id).map_err(describe)?;
    println!("🗑️ Producto eliminado: {id}");
    Ok(())
}

fn clear<R: ProductRepository>(service: &ProductService<R>, args: ClearArgs) -> Result<(), String> {
    if !args.yes {
        return Err("❌ Use --yes para confirmar el borrado de todos los productos".to_string());
    }

    service.delete_all_products().map_err(describe)?;
    println!("⚠️ Toda la data ha sido eliminada");
    Ok(())
}

fn export<R: ProductRepository>(service: &ProductService<R>, args: ExportArgs) -> Result<(), String> {
    let csv = service.export_csv().map_err(describe)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, csv).map_err(|error| {
                format!("❌ no se pudo escribir `{}`: {error}", path.display())
            })?;
            println!("📥 CSV exportado a {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

fn raw_input(args: ProductArgs, default_on_sale: &str) -> RawProductInput {
    RawProductInput {
        name: args.name.unwrap_or_default(),
        price: args.price,
        categories: args.categories,
        on_sale: args.on_sale.unwrap_or_else(|| default_on_sale.to_string()),
    }
}

fn stored_on_sale_label<R: ProductRepository>(
    service: &ProductService<R>,
    id: ProductId,
) -> Result<String, String> {
    let product = service
        .get_product(id)
        .map_err(describe)?
        .ok_or_else(|| describe(ServiceError::NotFound(id)))?;
    Ok(service.tokens().label(product.on_sale).to_string())
}

fn headline(product: &Product) -> String {
    format!("🟢 {} ({})", product.name, display_price(product.price))
}

fn display_price(price: Decimal) -> String {
    format!("S/ {price:.2}")
}

/// One `❌` line per rejection reason.
fn describe(error: ServiceError) -> String {
    match error {
        ServiceError::Validation(errors) => errors
            .errors()
            .iter()
            .map(|reason| format!("❌ {reason}"))
            .collect::<Vec<_>>()
            .join("\n"),
        other => format!("❌ {other}"),
    }
}
