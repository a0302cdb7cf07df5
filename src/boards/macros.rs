/// Generates the read side every board shares: a snapshot of the local
/// collection, lookup by id and, for queryable records, a filtered view.
///
/// The board must hold a `CollectionClient<$entity>` in a field named `$plural`.
macro_rules! impl_board_reads {
    ($board:ident, $entity:ty, $plural:ident, $singular:ident $(, $view:ident)?) => {
        paste::paste! {
            impl $board {
                /// Local records in display order, including unconfirmed changes.
                pub async fn $plural(&self) -> Result<Vec<$entity>, crate::error::BoardError> {
                    Ok(self.$plural.snapshot().await?)
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $singular>](
                    &self,
                    id: &str,
                ) -> Result<Option<$entity>, crate::error::BoardError> {
                    tracing::debug!("Sending request");
                    Ok(self.$plural.get(id.to_string()).await?)
                }

                $(
                    /// Applies `query` to the current snapshot.
                    pub async fn $view(
                        &self,
                        query: &crate::query::ListQuery,
                    ) -> Result<Vec<$entity>, crate::error::BoardError> {
                        let items = self.$plural.snapshot().await?;
                        Ok(query.apply(&items))
                    }
                )?
            }
        }
    };
}
