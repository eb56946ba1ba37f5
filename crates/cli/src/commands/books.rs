//! Catalog commands.
//!
//! # Usage
//!
//! ```bash
//! kotob books list --search "رحلة" --stock inStock --sort price
//! kotob books categories
//! kotob books show 65f1c0a2e4
//!
//! # Admin
//! kotob books create --name "Book" --title "Title" --category روايات --price 120 \
//!     --quantity 10 --image cover.jpg
//! kotob books offer 65f1c0a2e4 15
//! kotob books stock 65f1c0a2e4 40
//! ```

use std::path::PathBuf;

use clap::{Args, Subcommand};
use kotob_client::images::ImageUpload;
use kotob_client::listing::{BookFilter, BookSort, unique_categories};
use kotob_client::services::BookForm;
use kotob_client::{ClientError, ClientState};
use kotob_core::{BookId, StockStatus};
use rust_decimal::Decimal;
use tracing::info;

use crate::output;

#[derive(Subcommand)]
pub enum BooksAction {
    /// List books
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,

        /// `inStock` or `outOfStock`
        #[arg(long)]
        stock: Option<StockStatus>,

        /// Case-insensitive match on name or title
        #[arg(short, long)]
        search: Option<String>,

        /// `name`, `price` or `quantity`
        #[arg(long, default_value = "name")]
        sort: BookSort,
    },
    /// List the categories in the catalog
    Categories,
    /// Show one book
    Show { id: BookId },
    /// Create a book (admin)
    Create {
        #[command(flatten)]
        fields: BookFields,

        /// Image files (at least one, at most five)
        #[arg(long = "image", required = true)]
        images: Vec<PathBuf>,
    },
    /// Replace a book's fields (admin); unset fields keep their current value
    Update {
        id: BookId,

        #[command(flatten)]
        fields: BookFieldUpdates,

        /// New image files; the current images are kept when none are given
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
    /// Delete a book (admin)
    Delete { id: BookId },
    /// Set the discount percentage (admin)
    Offer { id: BookId, offer: Decimal },
    /// Set the available quantity (admin)
    Stock { id: BookId, quantity: u32 },
}

#[derive(Args)]
pub struct BookFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    category: String,
    #[arg(long, default_value = "")]
    code: String,
    #[arg(long)]
    price: Decimal,
    #[arg(long, allow_negative_numbers = true)]
    quantity: i64,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "0")]
    offer: Decimal,
}

#[derive(Args)]
pub struct BookFieldUpdates {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    code: Option<String>,
    #[arg(long)]
    price: Option<Decimal>,
    #[arg(long, allow_negative_numbers = true)]
    quantity: Option<i64>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    offer: Option<Decimal>,
}

impl From<BookFields> for BookForm {
    fn from(fields: BookFields) -> Self {
        Self {
            name: fields.name,
            title: fields.title,
            category: fields.category,
            code: fields.code,
            price: fields.price,
            quantity: fields.quantity,
            description: fields.description,
            offer: fields.offer,
        }
    }
}

impl BookFieldUpdates {
    fn apply(self, form: &mut BookForm) {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(category) = self.category {
            form.category = category;
        }
        if let Some(code) = self.code {
            form.code = code;
        }
        if let Some(price) = self.price {
            form.price = price;
        }
        if let Some(quantity) = self.quantity {
            form.quantity = quantity;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(offer) = self.offer {
            form.offer = offer;
        }
    }
}

async fn read_images(paths: &[PathBuf]) -> Result<Vec<ImageUpload>, ClientError> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        images.push(ImageUpload::from_path(path).await?);
    }
    Ok(images)
}

pub async fn run(state: &ClientState, action: BooksAction) -> Result<(), ClientError> {
    let api_base = state.api().base_url();
    match action {
        BooksAction::List {
            category,
            stock,
            search,
            sort,
        } => {
            let books = state.books().list().await?;
            let filter = BookFilter {
                category,
                stock,
                search,
                sort,
            };
            let matched = filter.apply(&books);
            for book in &matched {
                output::book(api_base, book);
            }
            info!(shown = matched.len(), total = books.len(), "Books");
        }
        BooksAction::Categories => {
            let books = state.books().list().await?;
            for category in unique_categories(&books) {
                let count = books.iter().filter(|b| b.category == category).count();
                info!(books = count, "{category}");
            }
        }
        BooksAction::Show { id } => {
            let book = state.books().get(&id).await?;
            output::book(api_base, &book);
            if !book.description.is_empty() {
                info!("{}", book.description);
            }
            info!(
                in_favorites = state.favorites().is_favorited(&id),
                in_cart = state.cart().is_in_cart(&id),
                "Status"
            );
        }
        BooksAction::Create { fields, images } => {
            let images = read_images(&images).await?;
            let book = state.books().create(fields.into(), images).await?;
            info!("تم إضافة الكتاب بنجاح");
            output::book(api_base, &book);
        }
        BooksAction::Update { id, fields, images } => {
            let current = state.books().get(&id).await?;
            let mut form = BookForm::from(&current);
            fields.apply(&mut form);
            let images = read_images(&images).await?;
            let book = state.books().update(&id, form, images).await?;
            info!("تم تحديث الكتاب بنجاح");
            output::book(api_base, &book);
        }
        BooksAction::Delete { id } => {
            let message = state.books().delete(&id).await?;
            info!("{}", message.as_deref().unwrap_or("تم حذف الكتاب بنجاح"));
        }
        BooksAction::Offer { id, offer } => {
            let book = state.books().set_offer(&id, offer).await?;
            output::book(api_base, &book);
        }
        BooksAction::Stock { id, quantity } => {
            let book = state.books().set_stock(&id, quantity).await?;
            output::book(api_base, &book);
        }
    }
    Ok(())
}
